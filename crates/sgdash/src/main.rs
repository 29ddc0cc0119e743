//! `sgdash` - CLI for Singapore traffic, weather and carpark data
//!
//! This binary wires the sgdash library to the command line: camera table
//! queries, live feeds, proximity searches, the snapshot poller and config.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use sgdash::carpark::{join_availability, CarparkDirectory};
use sgdash::cli::{
    CamerasCommand, Cli, Command, ConfigCommand, DatasetCommand, ExportFormat, FeedCommand,
    GeocodeCommand, LocationArgs, NearbyCommand, OutputFormat, SnapshotsCommand,
};
use sgdash::environment::{
    active_flood_alerts, daily_outlook, HeatStress, PsiSummary, TwoHourOutlook, UvBand, UvSummary,
    WbgtSummary, PSI_KEY,
};
use sgdash::feed::types::AreaForecast;
use sgdash::feed::{ApiClient, BusStop, Dataset, DatasetCache, OneMapAuth, SpeedBandRecord};
use sgdash::poller::{apply_retention, Poller, PollerConfig};
use sgdash::snapshot::{sgt, snapshots_from_feed};
use sgdash::spatial::{filter_within_radius, Coordinate};
use sgdash::traffic::{average_speed, SpeedBand};
use sgdash::weather::{knots_to_kmh, Beaufort, ReadingSummary, RealtimeEndpoint};
use sgdash::{init_logging, CameraLocation, CameraSnapshot, CameraTable, Config, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        // Config commands must work even when the config file is broken
        Command::Config(cmd) => handle_config(cli.config, cmd),
        Command::Cameras(cmd) => handle_cameras(&load_config(cli.config.as_deref())?, cmd),
        Command::Feed(cmd) => handle_feed(&load_config(cli.config.as_deref())?, cmd).await,
        Command::Nearby(cmd) => handle_nearby(&load_config(cli.config.as_deref())?, cmd).await,
        Command::Geocode(cmd) => handle_geocode(&load_config(cli.config.as_deref())?, cmd).await,
        Command::Poll(cmd) => handle_poll(&load_config(cli.config.as_deref())?, cmd.once).await,
        Command::Snapshots(cmd) => handle_snapshots(&load_config(cli.config.as_deref())?, cmd),
        Command::Dataset(cmd) => handle_dataset(&load_config(cli.config.as_deref())?, cmd).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_from(path.map(Path::to_path_buf)).context("failed to load configuration")
}

fn camera_table(config: &Config) -> Result<CameraTable> {
    match &config.cameras.table_path {
        Some(path) => CameraTable::load_csv_or_fallback(path)
            .with_context(|| format!("failed to load camera table {}", path.display())),
        None => Ok(CameraTable::snapshot()),
    }
}

fn api_client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(&config.api, config.request_timeout()).context("failed to build HTTP client")
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_camera(camera: &CameraLocation) {
    println!(
        "{:>5}  {:>12.6}  {:>12.6}  {}",
        camera.id, camera.latitude, camera.longitude, camera.description
    );
}

fn handle_cameras(config: &Config, cmd: CamerasCommand) -> Result<()> {
    let table = camera_table(config)?;

    match cmd {
        CamerasCommand::List { format } => match format {
            OutputFormat::Json => print_json(&table.iter().collect::<Vec<_>>())?,
            OutputFormat::Table => {
                println!("{:>5}  {:>12}  {:>12}  DESCRIPTION", "ID", "LATITUDE", "LONGITUDE");
                table.iter().for_each(print_camera);
                println!();
                println!("{} cameras", table.len());
            }
            OutputFormat::Plain => table.iter().for_each(print_camera),
        },
        CamerasCommand::Show { id } => {
            let camera = table.require(id)?;
            println!("Camera {}", camera.id);
            println!("  Description: {}", camera.description);
            println!("  Latitude:    {}", camera.latitude);
            println!("  Longitude:   {}", camera.longitude);
        }
        CamerasCommand::Validate => {
            let violations = table.validate();
            if violations.is_empty() {
                println!("All {} cameras are valid.", table.len());
            } else {
                for v in &violations {
                    println!("{v}");
                }
                bail!("{} problems found in the camera table", violations.len());
            }
        }
        CamerasCommand::Export { format, output } => {
            let body = match format {
                ExportFormat::Json => table.to_json()?,
                ExportFormat::Csv => table.to_csv()?,
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Wrote {} cameras to {}", table.len(), path.display());
                }
                None => print!("{body}"),
            }
        }
        CamerasCommand::Search { pattern } => {
            let matches = table.search(&pattern)?;
            matches.iter().copied().for_each(print_camera);
            if matches.is_empty() {
                println!("No cameras match \"{pattern}\"");
            }
        }
        CamerasCommand::Nearby { point, radius_km } => {
            let centre = Coordinate::from(point);
            let within = table.within_radius(centre, radius_km);
            if within.is_empty() {
                println!("No cameras within {radius_km} km");
                if let Some(nearest) = table.nearest(centre) {
                    println!(
                        "Nearest is {} ({}) at {:.2} km",
                        nearest.item.id, nearest.item.description, nearest.distance_km
                    );
                }
            }
            for ranked in within {
                println!(
                    "{:>5}  {:>6.2} km  {}",
                    ranked.item.id, ranked.distance_km, ranked.item.description
                );
            }
        }
    }
    Ok(())
}

async fn handle_feed(config: &Config, cmd: FeedCommand) -> Result<()> {
    let client = api_client(config)?;

    match cmd {
        FeedCommand::Traffic { format } => {
            let table = camera_table(config)?;
            let response = client.traffic_images().await?;
            let (snapshots, skipped) = snapshots_from_feed(response.cameras(), &table);
            if format == OutputFormat::Json {
                return print_json(&snapshots);
            }
            for snap in &snapshots {
                println!(
                    "{:>5}  {}  {}  {}",
                    snap.camera_id,
                    snap.captured_at.with_timezone(&sgt()).format("%Y-%m-%d %H:%M:%S"),
                    snap.description.as_deref().unwrap_or("-"),
                    snap.image_url
                );
            }
            if skipped > 0 {
                println!("{skipped} feed entries skipped (non-numeric camera id)");
            }
        }
        FeedCommand::Taxi { format } => {
            let taxis = client.taxi_availability().await?;
            let positions = taxis.positions();
            if format == OutputFormat::Json {
                return print_json(&positions);
            }
            if let Some(summary) = taxis.summary() {
                println!("{} taxis available at {}", summary.taxi_count, summary.timestamp);
            }
            if format == OutputFormat::Table {
                for p in &positions {
                    println!("{:>10.6}  {:>11.6}", p.latitude, p.longitude);
                }
            }
        }
        FeedCommand::Weather { endpoint, format } => {
            let endpoint = RealtimeEndpoint::from(endpoint);
            let data = client.realtime(endpoint).await?;
            let summary = ReadingSummary::from_data(&data);
            if format == OutputFormat::Json {
                return print_json(&summary);
            }
            print_weather(endpoint, &summary, format == OutputFormat::Table);
        }
        FeedCommand::Psi { format } => {
            let summary = PsiSummary::from_data(&client.psi().await?);
            if format == OutputFormat::Json {
                return print_json(&summary);
            }
            let Some(summary) = summary else {
                println!("No PSI readings available");
                return Ok(());
            };
            println!("PSI at {}", sgt_time(summary.updated));
            for region in &summary.regions {
                let psi = region.psi.map_or_else(|| "-".to_string(), |v| format!("{v:.0}"));
                let band = region.band.map_or("", |b| b.label());
                println!("  {:<8} {psi:>4}  {band}", region.region);
                if format == OutputFormat::Table {
                    for p in region.pollutants.iter().filter(|p| p.pollutant.key != PSI_KEY) {
                        println!(
                            "           {:<28} {} {}",
                            p.pollutant.label, p.value, p.pollutant.unit
                        );
                    }
                }
            }
        }
        FeedCommand::Uv { format } => {
            let summary = UvSummary::from_data(&client.uv_index().await?);
            if format == OutputFormat::Json {
                return print_json(&summary);
            }
            let Some(summary) = summary else {
                println!("No UV readings available");
                return Ok(());
            };
            let band = |b: Option<UvBand>| b.map_or("", UvBand::label);
            println!(
                "UV index {} ({}) at {}",
                summary.latest.value,
                band(summary.latest.band),
                summary.latest.hour.with_timezone(&sgt()).format("%H:%M")
            );
            println!(
                "Peak {} ({}) at {}",
                summary.peak.value,
                band(summary.peak.band),
                summary.peak.hour.with_timezone(&sgt()).format("%H:%M")
            );
            if format == OutputFormat::Table {
                for h in &summary.hours {
                    println!("  {}  {:>4}", h.hour.with_timezone(&sgt()).format("%H:%M"), h.value);
                }
            }
        }
        FeedCommand::Wbgt { format } => {
            let summary = WbgtSummary::from_data(&client.wbgt().await?);
            if format == OutputFormat::Json {
                return print_json(&summary);
            }
            let Some(summary) = summary else {
                println!("No WBGT readings available");
                return Ok(());
            };
            println!("WBGT at {}", sgt_time(summary.updated));
            if let Some(hottest) = summary.hottest() {
                println!("Hottest: {} at {:.1}°C", hottest.name, hottest.wbgt);
            }
            if format == OutputFormat::Table {
                for station in &summary.stations {
                    let level = station.level.map_or("", HeatStress::label);
                    println!("  {:<32} {:>5.1}°C  {level}", station.name, station.wbgt);
                }
            }
        }
        FeedCommand::Forecast {
            area,
            lat,
            lon,
            format,
        } => {
            let Some(outlook) = TwoHourOutlook::from_response(&client.two_hour_forecast().await?)
            else {
                println!("No forecast available");
                return Ok(());
            };
            let picked: Vec<&AreaForecast> = match (area, lat.zip(lon)) {
                (Some(name), _) => match outlook.for_area(&name) {
                    Some(f) => vec![f],
                    None => bail!("no forecast area named '{name}'"),
                },
                (None, Some((lat, lon))) => {
                    let Some((f, km)) = outlook.nearest(Coordinate::new(lat, lon)) else {
                        bail!("no forecast area positions in the response");
                    };
                    info!("Nearest forecast area is {} at {km:.1} km", f.area);
                    vec![f]
                }
                (None, None) => outlook.areas.iter().collect(),
            };
            if format == OutputFormat::Json {
                return print_json(&picked);
            }
            if let (Some(from), Some(to)) = (outlook.valid_from, outlook.valid_to) {
                println!(
                    "Forecast {} to {}",
                    from.with_timezone(&sgt()).format("%H:%M"),
                    to.with_timezone(&sgt()).format("%H:%M")
                );
            }
            for f in picked {
                println!("  {:<24} {}", f.area, f.forecast);
            }
        }
        FeedCommand::Outlook { format } => {
            let data = client.daily_forecast().await?;
            let general = daily_outlook(&data);
            if format == OutputFormat::Json {
                return print_json(&general);
            }
            let Some(g) = general else {
                println!("No 24-hour forecast available");
                return Ok(());
            };
            println!("{}", g.forecast.text);
            println!("  Temperature: {} - {} °C", g.temperature.low, g.temperature.high);
            println!(
                "  Humidity:    {} - {} %",
                g.relative_humidity.low, g.relative_humidity.high
            );
            println!(
                "  Wind:        {} - {} km/h {}",
                g.wind.speed.low, g.wind.speed.high, g.wind.direction
            );
        }
        FeedCommand::Floods => {
            let alerts = active_flood_alerts(&client.flood_alerts().await?);
            if alerts.is_empty() {
                println!("No flood alerts");
            }
            for alert in alerts {
                println!("FLOOD ALERT: {alert}");
            }
        }
        FeedCommand::Carparks => {
            let availability = client.carpark_availability().await?;
            let (mut total, mut free, mut carparks) = (0_u64, 0_u64, 0_usize);
            for carpark in availability.carparks() {
                carparks += 1;
                for lot in &carpark.carpark_info {
                    total += u64::from(lot.total());
                    free += u64::from(lot.available());
                }
            }
            println!("{carparks} carparks reporting, {free} of {total} lots free");
        }
        FeedCommand::SpeedBands { road } => {
            let records: Vec<SpeedBandRecord> = client.datamall("v4/TrafficSpeedBands").await?;
            let needle = road.map(|r| r.to_uppercase());
            let mut by_road: BTreeMap<String, Vec<SpeedBand>> = BTreeMap::new();
            for record in records {
                if needle
                    .as_deref()
                    .is_some_and(|n| !record.road_name.to_uppercase().contains(n))
                {
                    continue;
                }
                by_road.entry(record.road_name).or_default().push(record.speed_band);
            }
            for (road, bands) in &by_road {
                if let Some(speed) = average_speed(bands) {
                    println!("{speed:>6.1} km/h  {:>4} links  {road}", bands.len());
                }
            }
        }
    }
    Ok(())
}

fn sgt_time(timestamp: Option<DateTime<FixedOffset>>) -> String {
    timestamp.map_or_else(
        || "unknown time".to_string(),
        |t| t.with_timezone(&sgt()).format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn print_weather(endpoint: RealtimeEndpoint, summary: &ReadingSummary, per_station: bool) {
    let Some(timestamp) = summary.timestamp else {
        println!("No {endpoint} readings available");
        return;
    };
    println!("{endpoint} at {}", timestamp.with_timezone(&sgt()).format("%Y-%m-%d %H:%M"));

    if let Some(avg) = summary.average {
        if endpoint == RealtimeEndpoint::WindSpeed {
            let kmh = knots_to_kmh(avg);
            let class = Beaufort::from_kmh(kmh).map_or_else(String::new, |b| format!(" ({b})"));
            println!("Average: {kmh:.1} km/h{class}");
        } else {
            println!("Average: {}", summary.format_value(avg));
        }
    }

    if per_station {
        println!();
        for station in &summary.stations {
            println!("  {:<32} {}", station.name, station.value);
        }
    }
}

async fn resolve_location(client: &ApiClient, location: LocationArgs) -> Result<Coordinate> {
    if let Some(point) = location.point() {
        return Ok(point);
    }
    let Some(place) = location.place else {
        bail!("give --lat and --lon, or --place");
    };
    let auth = OneMapAuth::new(client.clone());
    let found = auth
        .locate(&place)
        .await
        .with_context(|| format!("failed to look up '{place}'"))?;
    println!("Near {} ({})", found.name, found.address);
    Ok(found.coordinate())
}

async fn handle_geocode(config: &Config, cmd: GeocodeCommand) -> Result<()> {
    let auth = OneMapAuth::new(api_client(config)?);
    let mut places = auth.search(&cmd.query).await?;
    places.truncate(cmd.limit);
    if cmd.format == OutputFormat::Json {
        return print_json(&places);
    }
    if places.is_empty() {
        println!("No matches for '{}'", cmd.query);
    }
    for place in &places {
        let at = place.coordinate();
        if cmd.format == OutputFormat::Table {
            println!("{:>9.5} {:>10.5}  {}", at.latitude, at.longitude, place.address);
        } else {
            println!("{}: {at}", place.name);
        }
    }
    Ok(())
}

async fn handle_nearby(config: &Config, cmd: NearbyCommand) -> Result<()> {
    let client = api_client(config)?;

    match cmd {
        NearbyCommand::BusStops {
            location,
            radius_km,
        } => {
            let centre = resolve_location(&client, location).await?;
            let stops: Vec<BusStop> = client.datamall("BusStops").await?;
            let (within, nearest) =
                filter_within_radius(centre, radius_km, stops, BusStop::coordinate);
            if within.is_empty() {
                println!("No bus stops within {radius_km} km");
                if let Some(n) = nearest {
                    println!(
                        "Nearest is {} ({}) at {:.2} km",
                        n.item.bus_stop_code, n.item.description, n.distance_km
                    );
                }
            }
            for r in within {
                println!(
                    "{}  {:>5.0} m  {}, {}",
                    r.item.bus_stop_code,
                    r.distance_km * 1000.0,
                    r.item.description,
                    r.item.road_name
                );
            }
        }
        NearbyCommand::Carparks { location, radius_m } => {
            let centre = resolve_location(&client, location).await?;
            let cache = DatasetCache::new(client.clone(), config.dataset_ttl());
            let csv = cache.get(Dataset::HdbCarpark).await?;
            let directory = CarparkDirectory::from_csv_reader(csv.as_slice())?;
            let nearby = directory.nearby(centre, radius_m);
            if nearby.is_empty() {
                println!("No carparks within {radius_m} m");
                return Ok(());
            }

            let availability = client
                .carpark_availability()
                .await
                .map_err(|e| warn!("Carpark availability unavailable: {e}"))
                .ok();
            let live = availability.iter().flat_map(|a| a.carparks());
            for status in join_availability(nearby, live) {
                let cp = &status.carpark;
                println!(
                    "{:<6} {:>5.0} m  {}",
                    cp.info.carpark_number, cp.distance_m, cp.info.address
                );
                if status.lots.is_empty() {
                    println!("         no live data");
                }
                for lot in &status.lots {
                    println!(
                        "         {:<26} {:>4}/{:<4} ({:.0}%)",
                        lot.type_name,
                        lot.available,
                        lot.total,
                        lot.percentage()
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_poll(config: &Config, once: bool) -> Result<()> {
    let client = api_client(config)?;
    let storage = open_storage(config)?;
    let table = camera_table(config)?;
    let mut poller = Poller::new(client, storage, table, PollerConfig::from_config(config));

    if once {
        let report = poller.poll_once().await?;
        println!(
            "{} cameras, {} new, {} duplicate, {} images saved, {} pruned",
            report.cameras, report.inserted, report.duplicates, report.images_saved, report.pruned
        );
        return Ok(());
    }

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping");
        }
        let _ = tx.send(true);
    });

    poller.run(rx).await;
    Ok(())
}

fn print_snapshots(snapshots: &[CameraSnapshot], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshots)?,
        OutputFormat::Table | OutputFormat::Plain => {
            if format == OutputFormat::Table {
                println!("{:>8}  {:>5}  {:<19}  MD5", "ID", "CAM", "CAPTURED (SGT)");
            }
            for s in snapshots {
                println!(
                    "{:>8}  {:>5}  {}  {}",
                    s.id.unwrap_or_default(),
                    s.camera_id,
                    s.captured_at.format("%Y-%m-%d %H:%M:%S"),
                    s.md5
                );
            }
        }
    }
    Ok(())
}

fn handle_snapshots(config: &Config, cmd: SnapshotsCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        SnapshotsCommand::Recent { limit, format } => {
            print_snapshots(&storage.get_recent(limit)?, format)?;
        }
        SnapshotsCommand::Camera { id, limit, format } => {
            print_snapshots(&storage.get_by_camera(id, limit)?, format)?;
        }
        SnapshotsCommand::Stats { json } => {
            let stats = storage.stats()?;
            if json {
                return print_json(&stats);
            }
            let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
                t.map_or_else(
                    || "-".to_string(),
                    |t| t.with_timezone(&sgt()).format("%Y-%m-%d %H:%M:%S").to_string(),
                )
            };
            println!("Database:   {}", storage.path().display());
            println!("Snapshots:  {}", stats.total_snapshots);
            println!("Cameras:    {}", stats.cameras);
            println!("Oldest:     {}", fmt_time(stats.oldest_snapshot));
            println!("Newest:     {}", fmt_time(stats.newest_snapshot));
            println!("Size:       {} bytes", stats.db_size_bytes);
        }
        SnapshotsCommand::Prune => {
            let pruned = apply_retention(&storage, &PollerConfig::from_config(config))?;
            println!("Pruned {pruned} snapshots");
        }
    }
    Ok(())
}

async fn handle_dataset(config: &Config, cmd: DatasetCommand) -> Result<()> {
    let dataset = Dataset::from(cmd.name);
    let cache = DatasetCache::new(api_client(config)?, config.dataset_ttl());
    let bytes = cache.get(dataset).await?;

    let path = cmd.output.unwrap_or_else(|| PathBuf::from(dataset.file_name()));
    std::fs::write(&path, bytes.as_slice())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Saved {} ({} bytes) to {}", dataset.name(), bytes.len(), path.display());
    Ok(())
}

fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    for secret in [
        &mut shown.api.data_gov_api_key,
        &mut shown.api.lta_account_key,
        &mut shown.api.onemap_password,
    ] {
        if secret.is_some() {
            *secret = Some("***".to_string());
        }
    }
    shown
}

fn handle_config(path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(path.as_deref())?;
            if json {
                return print_json(&redacted(&config));
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[API]");
            println!("  Data.gov.sg:        {}", config.api.data_gov_url);
            println!("  Realtime:           {}", config.api.realtime_url);
            println!("  Datasets:           {}", config.api.datasets_url);
            println!("  DataMall:           {}", config.api.datamall_url);
            println!("  OneMap:             {}", config.api.onemap_url);
            println!("  Data.gov key set:   {}", config.api.data_gov_api_key.is_some());
            println!("  DataMall key set:   {}", config.api.lta_account_key.is_some());
            println!("  OneMap login set:   {}", config.api.onemap_email.is_some());
            println!("  Timeout (secs):     {}", config.api.timeout_secs);
            println!();
            println!("[Storage]");
            println!("  Database path:      {}", config.database_path().display());
            println!("  Max snapshots:      {}", config.storage.max_snapshots);
            println!("  Max age (days):     {}", config.storage.max_age_days);
            println!();
            println!("[Poll]");
            println!("  Interval (secs):    {}", config.poll.interval_secs);
            println!("  Download images:    {}", config.poll.download_images);
            println!("  Image directory:    {}", config.image_dir().display());
            println!();
            println!("[Cache]");
            println!("  Dataset TTL (h):    {}", config.cache.dataset_ttl_hours);
        }
        ConfigCommand::Path => {
            println!("{}", path.unwrap_or_else(Config::default_config_path).display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
