use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    lotwise::report::run_lot_report(std::env::args().skip(1))
}
