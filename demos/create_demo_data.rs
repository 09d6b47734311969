use cafeteria::{SqliteTransactionSource, StudentId, Transaction, DEFAULT_TABLE};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "cafeteria.db".to_string());
    let table = std::env::var("CAFETERIA_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string());
    let mut source = SqliteTransactionSource::create(&path, table)?;

    // Meal windows with a few minutes of spread, plus one late snack per day
    let slots = [(7, 5), (8, 20), (11, 40), (13, 10), (18, 45), (21, 30)];
    let students: Vec<(StudentId, &str)> = (1..=40)
        .map(|i| {
            let sex = if i % 3 == 0 { "F" } else { "M" };
            StudentId::new(format!("ETS{:04}/15", i)).map(|id| (id, sex))
        })
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::new();
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad start date")?;
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).ok_or("bad end date")?;

    while day <= end {
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        for (id, sex) in &students {
            for (hour, minute) in slots {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                // Skip most late snacks and a share of weekend meals
                let skip = (hour == 21 && seed % 4 != 0) || (weekend && seed % 3 == 0);
                if skip {
                    continue;
                }
                let Some(ts) = day.and_hms_opt(hour, minute, (seed % 60) as u32) else {
                    continue;
                };
                let charge = match hour {
                    7 | 8 => 15.0,
                    11..=13 => 25.0,
                    _ => 20.0,
                };
                rows.push(Transaction::new(
                    id.clone(),
                    Some(sex.to_string()),
                    Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
                    charge,
                ));
            }
        }
        day += Duration::days(1);
    }

    // A handful of rows the dashboard must tolerate
    for raw in ["", "unknown", "2024-02-30 12:00:00"] {
        rows.push(Transaction::new(
            students[0].0.clone(),
            Some("M".to_string()),
            Some(raw.to_string()),
            10.0,
        ));
    }

    let inserted = source.insert_transactions_batch(&rows)?;
    log::info!("Inserted {} transactions into {} ({})", inserted, path, source.table());

    println!("Demo data created. Start the server with:");
    println!("  DATABASE_PATH={} cargo run --bin cafeteria-server", path);
    println!("Then try:");
    println!("  curl 'http://127.0.0.1:3000/dashboard?meals=lunch&weekdays=Monday,Friday'");
    println!("  curl -OJ 'http://127.0.0.1:3000/export/timeseries?start=2024-02-01&end=2024-04-30'");

    Ok(())
}
