//! Integration test: SQLite read through to the report artifact

use gasmon::config::PipelineConfig;
use gasmon::eval::ComparisonReport;
use gasmon::pipeline;
use rusqlite::Connection;

fn scratch_path(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gasmon_it_{}_{}", name, std::process::id()));
    path
}

fn seed_database(db_path: &str) {
    let conn = Connection::open(db_path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE gas_monitoring (
            "Session ID" TEXT,
            "Temperature" REAL,
            "Humidity" REAL,
            "CO2_InfraredSensor" REAL,
            "CO2_ElectroChemicalSensor" REAL,
            "MetalOxideSensor_Unit1" REAL,
            "MetalOxideSensor_Unit2" REAL,
            "MetalOxideSensor_Unit3" REAL,
            "MetalOxideSensor_Unit4" REAL,
            "CO_GasSensor" TEXT,
            "HVAC Operation Mode" TEXT,
            "Ambient Light Level" TEXT,
            "Time of Day" TEXT,
            "Activity Level" TEXT
        );
        "#,
    )
    .unwrap();

    let gas_levels = ["extremely low", "low", "medium", "high", "extremely high"];
    let hvac_modes = ["cooling", "heating", "off"];
    let light_levels = ["very_dim", "dim", "moderate", "bright", "very_bright"];
    let times = ["morning", "afternoon", "evening", "night"];
    let activities = ["Low Activity", "Moderate Activity", "High Activity"];

    let mut stmt = conn
        .prepare(
            "INSERT INTO gas_monitoring VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .unwrap();

    for i in 0..90usize {
        let class = i / 30;
        let temperature: Option<f64> = if i % 17 == 3 {
            None
        } else {
            Some(18.0 + class as f64 * 3.0 + (i % 5) as f64 * 0.2)
        };
        let co_gas = if i % 9 == 4 {
            "None"
        } else {
            gas_levels[(class + i % 2).min(4)]
        };

        stmt.execute(rusqlite::params![
            format!("session-{i:03}"),
            temperature,
            40.0 + class as f64 * 5.0 + (i % 7) as f64 * 0.5,
            400.0 + class as f64 * 150.0 + (i % 4) as f64 * 10.0,
            380.0 + class as f64 * 160.0 + (i % 3) as f64 * 12.0,
            1.5 + class as f64 * 0.8 + (i % 6) as f64 * 0.05,
            2.0 + class as f64 * 0.8 + (i % 6) as f64 * 0.05,
            2.5 + class as f64 * 0.8 + (i % 6) as f64 * 0.05,
            3.0 + class as f64 * 0.8 + (i % 6) as f64 * 0.05,
            co_gas,
            hvac_modes[i % 3],
            light_levels[(class * 2).min(4)],
            times[i % 4],
            activities[class],
        ])
        .unwrap();
    }
}

#[test]
fn test_sqlite_to_report() {
    let db_path = scratch_path("db").with_extension("db");
    let db_path_str = db_path.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&db_path);
    seed_database(&db_path_str);

    let config = PipelineConfig::default().with_db_path(&db_path_str);
    let report = pipeline::run(&config).unwrap();

    let names: Vec<&String> = report.models().collect();
    assert_eq!(names, vec!["gbt", "logreg", "mlp"]);

    let artifact = scratch_path("report").with_extension("json");
    report.save(&artifact).unwrap();

    let loaded = ComparisonReport::load(&artifact).unwrap();
    assert_eq!(loaded, report);

    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(&artifact);
}

#[test]
fn test_missing_database_is_fatal() {
    let config = PipelineConfig::default().with_db_path("/nonexistent/dir/readings.db");
    assert!(pipeline::run(&config).is_err());
}
