use pipestreams::{pipe, pipe_with_capacity, Error, PipeReader, PipeWriter, Source};
use std::{thread, time::Duration};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn available_reports_everything_written() {
    init_logging();
    let (mut writer, mut reader) = pipe::<u8>();
    let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();

    let expected = data.clone();
    let handle = thread::spawn(move || {
        writer.write(&data).unwrap();
        writer
    });
    let writer = handle.join().unwrap();

    assert_eq!(reader.available(), 1000);
    assert_eq!(reader.read_one().unwrap(), Some(expected[0]));
    let mut rest = vec![0; 999];
    reader.read_exact(&mut rest).unwrap();
    assert_eq!(rest, &expected[1..]);
    drop(writer);
    assert_eq!(reader.read_one().unwrap(), None);
}

#[test]
fn writer_blocks_until_reader_drains() -> anyhow::Result<()> {
    init_logging();
    let (mut writer, mut reader) = pipe_with_capacity::<u8>(16)?;
    let data: Vec<u8> = (0..10_000).map(|i| (i * 7 % 256) as u8).collect();

    let expected = data.clone();
    let producer = thread::spawn(move || -> pipestreams::Result<()> {
        for chunk in data.chunks(333) {
            writer.write(chunk)?;
        }
        writer.close();
        Ok(())
    });

    let mut received = Vec::new();
    reader.read_to_end(&mut received)?;
    producer.join().unwrap()?;
    assert_eq!(received, expected);
    Ok(())
}

#[test]
fn reader_drains_then_sees_end() {
    init_logging();
    let (mut writer, mut reader) = pipe::<u8>();
    writer.write(b"last words").unwrap();
    writer.close();

    let mut buf = [0; 64];
    let outcome = reader.read_outcome(&mut buf).unwrap();
    assert_eq!(&buf[..outcome.size], b"last words");
    assert!(outcome.status.is_end());
    assert!(reader.read_outcome(&mut buf).unwrap().is_eof());
    assert!(reader.read_outcome(&mut buf).unwrap().is_eof());
}

#[test]
fn blocked_reader_wakes_when_writer_closes() {
    init_logging();
    let (mut writer, mut reader) = pipe::<u8>();
    let consumer = thread::spawn(move || reader.read_one());
    thread::sleep(Duration::from_millis(50));
    writer.close();
    assert_eq!(consumer.join().unwrap().unwrap(), None);
}

#[test]
fn blocked_writer_breaks_when_reader_goes_away() {
    init_logging();
    let (mut writer, reader) = pipe_with_capacity::<u8>(8).unwrap();
    let producer = thread::spawn(move || writer.write(&[1; 64]));
    thread::sleep(Duration::from_millis(50));
    drop(reader);
    let err = producer.join().unwrap().unwrap_err();
    assert!(matches!(err, Error::BrokenPipe));
    assert!(err.is_io());
}

#[test]
fn write_after_reader_closed_is_a_broken_pipe() {
    init_logging();
    let (mut writer, mut reader) = pipe::<u8>();
    reader.close();
    let err = std::io::Write::write(&mut writer, b"x").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    assert!(err.to_string().contains("broken pipe"));
}

#[test]
fn late_connection_across_threads() {
    init_logging();
    let mut reader = PipeReader::<char>::new();
    let mut writer = PipeWriter::new();
    assert_eq!(reader.available(), 0);
    writer.connect(&reader).unwrap();

    let producer = thread::spawn(move || {
        let text: Vec<char> = "ünïcode".chars().collect();
        writer.write(&text).unwrap();
    });
    producer.join().unwrap();

    let mut received = Vec::new();
    reader.read_to_end(&mut received).unwrap();
    assert_eq!(received.into_iter().collect::<String>(), "ünïcode");
}
