use tabled::Table;

use crate::{source::STATIONS, types::StationTableRow};

pub fn stations() {
    let rows: Vec<StationTableRow> = STATIONS
        .iter()
        .map(|station| StationTableRow {
            key: station.key.to_string(),
            name: station.name.to_string(),
            url: station.url.to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
}
