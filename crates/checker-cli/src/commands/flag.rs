//! `checkerctl flag` — derive and verify flags from the command line.

use anyhow::Context;
use checker_core::{CheckerConfig, FlagDeriver, ServiceId, TeamId, Tick, Timestamp};
use serde::Serialize;

pub fn derive(
    config: &CheckerConfig,
    team: u32,
    service: u32,
    tick: Tick,
    payload_hex: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", derive_flag(config, team, service, tick, payload_hex)?);
    Ok(())
}

pub fn verify(config: &CheckerConfig, token: &str, format: &str) -> anyhow::Result<()> {
    let report = verify_flag(config, token)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("valid flag");
            println!("  team:      {}", report.team);
            println!("  service:   {}", report.service);
            println!("  timestamp: {}", report.timestamp);
            match report.tick {
                Some(tick) => println!("  tick:      {tick}"),
                None => println!("  tick:      (before competition start)"),
            }
            println!("  payload:   {}", report.payload);
        }
    }
    Ok(())
}

/// Decoded fields of a verified flag, as printed by `verify`.
#[derive(Debug, Serialize)]
pub struct FlagReport {
    pub team: TeamId,
    pub service: ServiceId,
    pub timestamp: Timestamp,
    /// Tick the timestamp falls in under the configured clock.
    pub tick: Option<Tick>,
    /// Hex-encoded payload bytes.
    pub payload: String,
}

pub fn verify_flag(config: &CheckerConfig, token: &str) -> anyhow::Result<FlagReport> {
    let generator = config.flag_generator()?;
    let info = generator.verify(token)?;
    let deriver = FlagDeriver::new(info.team, info.service, &generator)
        .with_clock(config.start_time(), config.tick_duration()?)?;

    Ok(FlagReport {
        team: info.team,
        service: info.service,
        timestamp: info.timestamp,
        tick: deriver.tick_for(info.timestamp),
        payload: hex::encode(info.payload),
    })
}

/// The flag `derive` prints.
pub fn derive_flag(
    config: &CheckerConfig,
    team: u32,
    service: u32,
    tick: Tick,
    payload_hex: Option<&str>,
) -> anyhow::Result<String> {
    let payload = payload_hex
        .map(|p| hex::decode(p.trim()).context("payload is not valid hex"))
        .transpose()?;
    let deriver = FlagDeriver::new(TeamId(team), ServiceId(service), config.flag_generator()?)
        .with_clock(config.start_time(), config.tick_duration()?)?;
    Ok(deriver.derive(tick, payload.as_deref())?)
}
