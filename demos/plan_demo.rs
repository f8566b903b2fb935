//! Demonstration of flight plan generation and waypoint output formats

use triangulation::{
    to_ecef, CsvFormatter, FlightPlan, FlightPlanner, GeoPosition, JsonFormatter, WaypointFormatter,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Drone Object Geolocation - Flight Plan Demo ===\n");

    // A 5 m high wall segment running east-west, drone hovering to the south
    let top_left = to_ecef(&GeoPosition { latitude: 49.0990, longitude: 12.1809, altitude: 455.0 })?;
    let bottom_right = to_ecef(&GeoPosition { latitude: 49.0990, longitude: 12.18098, altitude: 450.0 })?;
    let drone = GeoPosition { latitude: 49.0988, longitude: 12.18094, altitude: 470.0 };

    let planner = FlightPlanner::new(3.0, 1.5);
    println!(
        "Standoff {:.1} m, descend step {:.1} m",
        planner.standoff_distance_m, planner.descend_step_m
    );

    let quad = planner.displaced_quad(&top_left, &bottom_right, &drone)?;
    println!("Displaced top-left:     {:.8}, {:.8}, {:.2} m", quad.top_left.latitude, quad.top_left.longitude, quad.top_left.altitude);
    println!("Displaced bottom-right: {:.8}, {:.8}, {:.2} m\n", quad.bottom_right.latitude, quad.bottom_right.longitude, quad.bottom_right.altitude);

    let plan = planner.generate_plan(&top_left, &bottom_right, &drone)?;
    println!("{} waypoints\n", plan.len());

    demonstrate_json_formatting(&plan)?;
    demonstrate_csv_formatting(&plan)?;

    // Corners at the same height leave nothing to sweep
    let level = to_ecef(&GeoPosition { latitude: 49.0990, longitude: 12.18098, altitude: 455.0 })?;
    let empty = planner.generate_plan(&top_left, &level, &drone)?;
    println!("Level corners: {} waypoints", empty.len());

    Ok(())
}

fn demonstrate_json_formatting(plan: &FlightPlan) -> Result<(), serde_json::Error> {
    println!("1. JSON (compact):");
    println!("   {}\n", JsonFormatter::new().format_plan(plan)?);

    println!("2. JSON (pretty):");
    println!("{}\n", JsonFormatter::pretty().format_plan(plan)?);
    Ok(())
}

fn demonstrate_csv_formatting(plan: &FlightPlan) -> Result<(), serde_json::Error> {
    println!("3. CSV:");
    print!("{}", CsvFormatter::new().format_plan(plan)?);

    println!("\n4. CSV (no header):");
    let formatter = CsvFormatter { include_header: false };
    print!("{}", formatter.format_plan(plan)?);
    println!();
    Ok(())
}
