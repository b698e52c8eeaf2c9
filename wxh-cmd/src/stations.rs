//! The `stations` command: list the bundled airport table.

use wxh_wunderground::station::Station;

/// Render the station table, one `CODE  City  Title` line per station.
pub fn format_stations(stations: &[Station]) -> String {
    let mut out = String::new();
    for station in stations {
        out.push_str(&format!(
            "{:<4}  {:<14}  {}\n",
            station.code, station.city, station.title
        ));
    }
    out
}

/// Entry point of `wxh stations`.
pub fn run_stations() -> anyhow::Result<()> {
    let stations = Station::get_station_vector()?;
    print!("{}", format_stations(&stations));
    Ok(())
}
