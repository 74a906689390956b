use std::io;

mod app;

#[tokio::main]
async fn main() -> io::Result<()> {
    app::run().await
}
