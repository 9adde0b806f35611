//! Projects DT cost and bonus over a range of emission days from an assumed
//! average daily trading volume.
//!
//! Usage: dt-calculator [avg_volume_cny] [start_day] [end_day]

use anyhow::{Context, Result};

use dt_tracker::config::Config;

/// Parse an optional positional argument, falling back to `default` only
/// when it is absent.
fn parse_arg<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {name}: {raw:?}")),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let clock = config.clock();
    let economics = config.economics();

    let mut args = std::env::args().skip(1);
    let avg_volume: f64 = parse_arg(args.next(), "avg_volume_cny", 8e8)?;
    let start_day: u32 = parse_arg(args.next(), "start_day", 43)?;
    let end_day: u32 = parse_arg(args.next(), "end_day", 365)?;

    let p = economics.project_by_volume(&clock, avg_volume, start_day, end_day)?;
    let start_release = clock.daily_release(clock.emission_period(start_day));

    println!("Start day:              {start_day}");
    println!("End day:                {end_day}");
    println!("Avg daily volume:       ¥{avg_volume:.2}");
    println!(
        "Start day cost (H/L):   ¥{:.4} / ¥{:.4}",
        economics.high_cost(start_release, avg_volume)?,
        economics.low_cost(start_release, avg_volume)?
    );
    println!("Start day bonus per DT: ¥{:.4}", p.start_bonus);
    println!("DT released by end:     {:.4}", p.total_release);
    println!("Total bonus per DT:     ¥{:.4}", p.total_bonus);
    println!("Avg daily bonus per DT: ¥{:.4}", p.daily_bonus);

    Ok(())
}
