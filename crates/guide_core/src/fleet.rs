//! Operator-side fleet roster. Mock data stands in for a telematics feed.

/// One jeepney unit as the operator dashboard sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetUnit {
    pub id: String,
    pub plate: String,
    pub driver: String,
    pub online: bool,
    pub earnings: f64,
    pub fuel_percent: u8,
    pub speed_kmh: f64,
}

/// The mock fleet monitored by the operator dashboard.
pub fn mock_fleet() -> Vec<FleetUnit> {
    let units = [
        ("SIA 506", "PUJ-1234", "Eduardo Ramirez", true, 50_120.00, 85, 32.0),
        ("SIA 507", "PUJ-1235", "Maria Santos", false, 99_720.00, 40, 0.0),
        ("SIA 508", "PUJ-1236", "Juan Dela Cruz", true, 97_720.00, 92, 28.0),
        ("SIA 509", "PUJ-1237", "Pedro Penduko", false, 99_730.00, 10, 0.0),
    ];
    units
        .into_iter()
        .map(
            |(id, plate, driver, online, earnings, fuel_percent, speed_kmh)| FleetUnit {
                id: id.to_string(),
                plate: plate.to_string(),
                driver: driver.to_string(),
                online,
                earnings,
                fuel_percent,
                speed_kmh,
            },
        )
        .collect()
}

/// Units currently reporting in.
pub fn online_units(fleet: &[FleetUnit]) -> Vec<&FleetUnit> {
    fleet.iter().filter(|unit| unit.online).collect()
}
