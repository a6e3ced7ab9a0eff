use peripage::{load_image, to_grayscale, Config, Fill, Printer, QuantizeMode, RfcommPort};
use std::env;

fn print_usage() {
    println!("Usage: cargo run --example print_image <FILE> [threshold|dither]");
    println!("Reads PERIPAGE_DEVICE from the environment or .env, default /dev/rfcomm0.");
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mode = match args.get(2).map(|s| s.as_str()) {
        Some("dither") => QuantizeMode::Dither,
        Some("threshold") | None => QuantizeMode::default(),
        Some(other) => {
            eprintln!("Error: Unknown mode '{}'", other);
            print_usage();
            return;
        }
    };

    let device = env::var("PERIPAGE_DEVICE").unwrap_or_else(|_| peripage::DEFAULT_DEVICE.to_string());
    let pixels = to_grayscale(&load_image(&args[1], peripage::DEVICE_WIDTH).unwrap());

    let port = RfcommPort::open(&device).unwrap();
    let mut printer = Printer::new(port, Config::new().mode(mode));

    match printer.print_pixels(&pixels) {
        Ok(()) => printer.send_feed(10, Fill::Blank).unwrap(),
        Err(err) => println!("ERROR {:#?}", err),
    }
}
