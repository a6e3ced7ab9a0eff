use image::Luma;
use peripage::{Config, PixelBuffer, PrintJob, Printer, RfcommPort, DEVICE_WIDTH};
use qrcode::QrCode;
use std::env;

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let text = env::args().nth(1).unwrap_or_else(|| "https://example.com".to_string());
    let device = env::var("PERIPAGE_DEVICE").unwrap_or_else(|_| peripage::DEFAULT_DEVICE.to_string());

    let code = QrCode::new(text.as_bytes()).unwrap();
    let qr = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .max_dimensions(DEVICE_WIDTH, DEVICE_WIDTH)
        .build();

    // center on a white strip the width of the paper
    let offset = (DEVICE_WIDTH - qr.width()) / 2;
    let pixels = PixelBuffer::from_fn(DEVICE_WIDTH, qr.height(), |x, y| {
        if x < offset || x >= offset + qr.width() {
            [255, 255, 255]
        } else {
            let l = qr.get_pixel(x - offset, y).0[0];
            [l, l, l]
        }
    });
    let plane = peripage::quantize(&pixels, peripage::DEFAULT_THRESHOLD).unwrap();

    let port = RfcommPort::open(&device).unwrap();
    let printer = Printer::new(port, Config::new());

    // print from a worker thread while the main thread waits
    let handle = printer.spawn(PrintJob::Bitmap(plane));
    let (_printer, result) = handle.join().unwrap();
    match result {
        Ok(()) => println!("printed {}", text),
        Err(err) => println!("ERROR {:#?}", err),
    }
}
