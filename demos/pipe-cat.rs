use pipestreams::{pipe, BufferedSink, Sink, Source, StdSink, StdSource};
use std::thread;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (mut writer, mut reader) = pipe::<u8>();
    let producer = thread::spawn(move || -> pipestreams::Result<()> {
        let mut stdin = StdSource::new(std::io::stdin());
        let mut buf = [0; 256];
        loop {
            let outcome = stdin.read_outcome(&mut buf)?;
            writer.write(&buf[..outcome.size])?;
            if outcome.status.is_end() {
                writer.close();
                return Ok(());
            }
        }
    });

    let mut stdout = BufferedSink::new(StdSink::new(std::io::stdout()));
    let mut buf = [0; 64];
    loop {
        let outcome = reader.read_outcome(&mut buf)?;
        Sink::write_all(&mut stdout, &buf[..outcome.size])?;
        if outcome.status.is_end() {
            break;
        }
    }
    stdout.close()?;
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("stdin thread panicked"))??;
    Ok(())
}
