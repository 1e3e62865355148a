use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ims_air_cleaner::config::CleaningConfig;
use ims_air_cleaner::models::{MeasurementField, RawRow, RawTable};
use ims_air_cleaner::processors::{CleaningPipeline, MissingValueHandler, TypeNormalizer};
use ims_air_cleaner::utils::constants::{DEFAULT_SAMPLING_HOURS, SOURCE_DATE_FORMAT};

// Four readings a day per station, with status tokens and gaps sprinkled in
fn create_raw_table(station_count: usize, days: usize) -> RawTable {
    let columns = MeasurementField::ALL.to_vec();
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut rows = Vec::with_capacity(station_count * days * DEFAULT_SAMPLING_HOURS.len());

    for station in 0..station_count {
        for day in 0..days {
            let date = (base_date + Duration::days(day as i64))
                .format(SOURCE_DATE_FORMAT)
                .to_string();
            for (slot, hour) in DEFAULT_SAMPLING_HOURS.iter().enumerate() {
                let values = (0..columns.len())
                    .map(|col| match (day + slot + col + station) % 13 {
                        0 => None,
                        1 => Some("Down".to_string()),
                        n => Some(format!("{:.1}", n as f64 * 7.5 - 20.0)),
                    })
                    .collect();
                rows.push(RawRow::new(format!("Station {}", station), date.clone(), *hour, values));
            }
        }
    }

    RawTable::with_rows(columns, rows).unwrap()
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    let raw = create_raw_table(10, 90);
    let pipeline = CleaningPipeline::new(
        CleaningConfig::default().with_categorical_columns(vec!["Station".to_string()]),
    )
    .unwrap();

    c.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let (table, _report) = pipeline.run(raw.clone()).unwrap();
            black_box(table.len())
        })
    });
}

fn benchmark_forward_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_fill_by_stations");

    for &stations in &[5, 20, 50] {
        let (table, _) = TypeNormalizer::new().normalize(create_raw_table(stations, 60));
        let handler = MissingValueHandler::default();

        group.bench_with_input(BenchmarkId::new("stations", stations), &table, |b, table| {
            b.iter(|| {
                let (filled, summary) = handler.forward_fill(table.clone());
                black_box((filled.len(), summary.total_filled()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_full_pipeline, benchmark_forward_fill);
criterion_main!(benches);
