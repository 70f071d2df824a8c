use clap::{value_parser, Arg, ArgAction, Command};
use std::time::{Duration, Instant};
use tinyfix::{
    BaudRate, Device, DynamicModel, IoTransport, NmeaDecoder, OutputRate, ReceiverSettings,
    SentenceOutputs, Transport,
};

fn main() {
    let matches = Command::new(clap::crate_name!())
        .about(clap::crate_description!())
        .author(clap::crate_authors!())
        .arg_required_else_help(true)
        .arg(
            Arg::new("port")
                .value_name("port")
                .short('p')
                .long("port")
                .required(true)
                .help("Serial port to open"),
        )
        .arg(
            Arg::new("baud")
                .value_name("baud")
                .short('s')
                .long("baud")
                .required(false)
                .default_value("9600")
                .value_parser(value_parser!(u32))
                .help("Baud rate of the port"),
        )
        .arg(
            Arg::new("configure")
                .long("configure")
                .action(ArgAction::SetTrue)
                .help("Push the automotive 5 Hz RMC-only configuration before decoding"),
        )
        .get_matches();

    let port_name = matches
        .get_one::<String>("port")
        .expect("Expected required 'port' cli argument");
    let baud = *matches.get_one::<u32>("baud").unwrap();

    let port = serialport::new(port_name, baud)
        .timeout(Duration::from_millis(10))
        .open()
        .expect("Could not open the serial port");

    let mut device = Device::new(IoTransport::new(port));

    if matches.get_flag("configure") {
        let settings = ReceiverSettings {
            nav_mode: DynamicModel::Automotive,
            output_rate: OutputRate::Hz5,
            baud_rate: BaudRate::B9600,
            outputs: SentenceOutputs::RMC,
        };
        device
            .apply(&settings)
            .expect("Receiver did not acknowledge the configuration");
        println!("Receiver configured");
    }

    println!("Opened {port_name}, waiting for sentences...");
    let started = Instant::now();
    let mut decoder = NmeaDecoder::new();
    loop {
        let byte = match device.transport_mut().read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => continue,
            Err(e) => panic!("Serial port read failed: {e}"),
        };
        let now_ms = started.elapsed().as_millis() as u32;
        if decoder.process_byte(byte, now_ms) {
            print_fix(&decoder, now_ms);
        }
    }
}

fn print_fix(decoder: &NmeaDecoder, now_ms: u32) {
    let fix = decoder.fix();
    let when = fix
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| String::from("time unknown"));
    println!(
        "{when}  lat {:.5}  lon {:.5}  alt {:.1} m  {:.2} kn  sats {}  age {} ms",
        fix.lat_degrees(),
        fix.lon_degrees(),
        fix.altitude_meters(),
        fix.speed_knots(),
        fix.satellites(),
        fix.position_age(now_ms),
    );
    let stats = decoder.statistics();
    println!(
        "    {} bytes, {} good sentences, {} failed checksums",
        stats.bytes_processed, stats.good_sentences, stats.failed_checksums
    );
}
