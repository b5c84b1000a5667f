use campus_recruit_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("recruitment service error: {err}");
        std::process::exit(1);
    }
}
