use pmedian::solver::pmedian::run;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run::run()
}
