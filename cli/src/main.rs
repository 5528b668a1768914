use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

const PROGRAM: &str = "geojson-cmd";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let Some((socket, command)) = parse_args(&args) else {
        let program = args.first().map_or(PROGRAM, String::as_str);
        eprintln!("Usage: {} <socket> <command> [args...]", program);
        eprintln!(
            "Example: {} /tmp/simple-geojson-server.sock updateService stops",
            program
        );
        std::process::exit(1);
    };

    let mut stream = UnixStream::connect(socket)
        .await
        .with_context(|| format!("connecting to {}", socket))?;
    stream.write_all(command.as_bytes()).await?;

    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    print!("{}", String::from_utf8_lossy(&buf[..n]));

    stream.shutdown().await?;
    Ok(())
}

/// Splits `argv` into the socket path and the space-joined command.
/// `None` when either is missing, including an empty `argv`.
fn parse_args(args: &[String]) -> Option<(&str, String)> {
    match args {
        [_, socket, command @ ..] if !command.is_empty() => {
            Some((socket.as_str(), command.join(" ")))
        }
        _ => None,
    }
}
