use std::fs;

use camino::Utf8PathBuf;
use chrono::{Local, TimeZone};

use gamedata_scraper::domain::{
    MergedRow, PrimaryRecord, RegionalSales, SalesFigure, SecondaryRecord,
};
use gamedata_scraper::sink::{CsvSink, RowSink};

fn row(name: &str) -> MergedRow {
    MergedRow::new(
        PrimaryRecord {
            name: name.to_string(),
            detail_url: format!("http://www.vgchartz.com/game/1/{name}/"),
            basename: name.to_string(),
            platform: "GBA".to_string(),
            release_year: "2002".to_string(),
            genre: "Role-Playing".to_string(),
            publisher: "Nintendo".to_string(),
            sales: RegionalSales {
                north_america: SalesFigure::from("6.06"),
                europe: SalesFigure::from("3.90"),
                japan: SalesFigure::from("5.38"),
                rest_of_world: SalesFigure::from("0.50"),
            },
            global_sales: SalesFigure::from("15.85"),
        },
        SecondaryRecord {
            critic_score: Some("82".to_string()),
            developer: Some("Game Freak".to_string()),
            ..SecondaryRecord::blank()
        },
    )
}

#[test]
fn rows_are_on_disk_before_the_sink_is_dropped() {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();
    let started = Local.with_ymd_and_hms(2014, 11, 30, 23, 59, 58).unwrap();

    let (mut sink, path) = CsvSink::create(&dir, &started).unwrap();
    assert_eq!(path, dir.join("gamedata-20141130-23_59_58.csv"));

    sink.write_row(&row("pokemon-ruby")).unwrap();
    let on_disk = fs::read_to_string(&path).unwrap();
    let lines = on_disk.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[2],
        "pokemon-ruby,GBA,2002,Role-Playing,Nintendo,6.06,3.90,5.38,0.50,15.85,,82,,,,,Game Freak,"
    );

    sink.write_row(&row("pokemon-sapphire")).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 4);
    assert_eq!(sink.rows_written(), 2);
}
