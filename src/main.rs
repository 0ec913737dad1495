// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

// Vantage station archive client
use clap::{Parser, Subcommand};
use chrono::NaiveDateTime;
use std::time::Duration;

use vantagelink::protocol::{VANTAGE_PRO2_ID, VANTAGE_VUE_ID};
use vantagelink::{SerialTransport, Station, TcpTransport, Transport};

#[derive(Parser)]
#[command(name = "vantagelink")]
#[command(about = "Archive and realtime data from Vantage Pro 2 / Vantage Vue stations", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// TCP address of a WeatherLink IP logger (host:port)
    #[arg(short, long, conflicts_with = "device")]
    addr: Option<String>,

    /// Serial device of a console data logger (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate for serial connections
    #[arg(short, long, default_value = "19200")]
    baud: u32,

    /// Per-read timeout in seconds
    #[arg(long, default_value = "5", value_name = "SECS")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the station answers on the link
    Test,
    /// Report station type and firmware version/date
    Info,
    /// Read one realtime LOOP2 packet
    Current,
    /// Download archive records
    Archive {
        /// Only records after this time ("YYYY-MM-DD HH:MM"); whole archive if absent
        #[arg(short, long, value_name = "DATETIME")]
        since: Option<String>,
    },
}

fn open_transport(cli: &Cli) -> Box<dyn Transport> {
    if let Some(addr) = &cli.addr {
        match TcpTransport::connect(addr.as_str()) {
            Ok(transport) => Box::new(transport),
            Err(e) => {
                eprintln!("Failed to connect to {}: {}", addr, e);
                std::process::exit(1);
            }
        }
    } else if let Some(device) = &cli.device {
        match SerialTransport::open(device, cli.baud) {
            Ok(transport) => Box::new(transport),
            Err(e) => {
                eprintln!("Failed to open serial device {}: {}", device, e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Error: either --addr or --device is required");
        std::process::exit(1);
    }
}

fn station_type_name(id: u8) -> String {
    match id {
        VANTAGE_PRO2_ID => "Vantage Pro 2".to_string(),
        VANTAGE_VUE_ID => "Vantage Vue".to_string(),
        other => format!("Unknown (id {})", other),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut station = Station::with_timeout(open_transport(&cli), Duration::from_secs(cli.timeout));

    let result = match &cli.command {
        Commands::Test => run_test(&mut station),
        Commands::Info => run_info(&mut station),
        Commands::Current => run_current(&mut station),
        Commands::Archive { since } => run_archive(&mut station, since.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_test(station: &mut Station) -> Result<(), vantagelink::StationError> {
    if station.test_call()? {
        println!("Station answered.");
        Ok(())
    } else {
        eprintln!("No answer from station");
        std::process::exit(1);
    }
}

fn run_info(station: &mut Station) -> Result<(), vantagelink::StationError> {
    println!("Station type:     {}", station_type_name(station.station_type()?));
    println!("Firmware version: {}", station.firmware_version()?);
    println!("Firmware date:    {}", station.firmware_date()?);
    Ok(())
}

fn run_current(station: &mut Station) -> Result<(), vantagelink::StationError> {
    let fields = station.current_conditions()?;
    for (name, value) in &fields {
        println!("{}: {}", name, value);
    }
    Ok(())
}

fn run_archive(station: &mut Station, since: Option<&str>) -> Result<(), vantagelink::StationError> {
    let records = match since {
        Some(text) => {
            let since = match NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M") {
                Ok(since) => since,
                Err(e) => {
                    eprintln!("Invalid --since value {:?}: {}", text, e);
                    std::process::exit(1);
                }
            };
            station.archive_since(since)?
        }
        None => station.archive_all()?,
    };

    for record in &records {
        print!("{}", record.timestamp.format("%Y-%m-%d %H:%M"));
        for (name, value) in &record.fields {
            print!("  {}={}", name, value);
        }
        println!();
    }
    println!("{} records", records.len());
    Ok(())
}
