#[tokio::main]
async fn main() {
    if let Err(e) = forumcore::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
