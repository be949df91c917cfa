use pipestreams::{
    pipe_with_capacity, BufferedSink, BufferedSource, DataSinkExt, DataSourceExt, Error,
    ErrorCategory, SliceSource, Source, VecSink,
};
use rstest::rstest;
use std::thread;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 31 % 256) as u8).collect()
}

fn take<S: Source<Unit = u8>>(source: &mut BufferedSource<S>, n: usize) -> Vec<u8> {
    let mut out = vec![0; n];
    Source::read_exact(source, &mut out).unwrap();
    out
}

#[rstest]
#[case(8, 0, 8, 8)]
#[case(8, 0, 20, 20)]
#[case(8, 5, 20, 20)]
#[case(8, 5, 4, 3)]
#[case(16, 3, 100, 64)]
#[case(1, 0, 10, 10)]
#[case(1024, 100, 4096, 4000)]
fn reset_replays_what_was_read(
    #[case] capacity: usize,
    #[case] before: usize,
    #[case] limit: usize,
    #[case] n: usize,
) {
    init_logging();
    let data = pattern(10_000);
    let mut source = BufferedSource::with_capacity(capacity, SliceSource::new(&data[..])).unwrap();
    take(&mut source, before);
    source.mark(limit);
    let first = take(&mut source, n);
    assert_eq!(first, &data[before..before + n]);
    source.reset().unwrap();
    assert_eq!(take(&mut source, n), first);
    assert_eq!(take(&mut source, 10), &data[before + n..before + n + 10]);
}

#[test]
fn unattached_skip() {
    let mut source = BufferedSource::<SliceSource<u8>>::unattached();
    assert_eq!(source.skip(0).unwrap(), 0);
    let err = source.skip(1).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
}

#[test]
fn available_fails_after_close() {
    let data = pattern(64);
    let mut source = BufferedSource::new(SliceSource::new(&data[..]));
    assert_eq!(source.available().unwrap(), 64);
    source.close().unwrap();
    assert!(matches!(source.available(), Err(Error::Closed)));
}

#[test]
fn large_writes_reach_the_sink() {
    init_logging();
    let data = pattern(2000);
    let mut sink = BufferedSink::with_capacity(512, VecSink::<u8>::new()).unwrap();
    sink.write_range(&data, 0, 500).unwrap();
    assert_eq!(sink.get_ref().unwrap().len(), 0);
    sink.flush().unwrap();
    assert_eq!(sink.get_ref().unwrap().len(), 500);

    sink.write_range(&data, 500, 513).unwrap();
    assert!(sink.get_ref().unwrap().len() >= 1000);
    sink.flush().unwrap();
    assert_eq!(sink.get_ref().unwrap().as_slice(), &data[..1013]);
}

#[test]
fn flush_after_close() {
    let mut sink = BufferedSink::new(VecSink::<u8>::new());
    sink.close().unwrap();
    sink.flush().unwrap();
}

#[test]
fn overflowing_write_flushes_first() {
    let mut sink = BufferedSink::with_capacity(3, VecSink::<u8>::new()).unwrap();
    sink.write_range(b"ab", 0, 2).unwrap();
    assert!(sink.get_ref().unwrap().is_empty());
    sink.write_range(b"cd", 0, 2).unwrap();
    assert_eq!(sink.get_ref().unwrap().as_slice(), b"ab");
    sink.flush().unwrap();
    assert_eq!(sink.get_ref().unwrap().as_slice(), b"abcd");
}

#[test]
fn closed_checks_come_before_range_checks() {
    let mut sink = BufferedSink::new(VecSink::<u8>::new());
    sink.close().unwrap();
    assert!(matches!(sink.write_range(b"x", 5, 5), Err(Error::Closed)));

    let data = pattern(4);
    let mut source = BufferedSource::new(SliceSource::new(&data[..]));
    source.close().unwrap();
    let mut buf = [0; 2];
    assert!(matches!(source.read_range(&mut buf, 3, 3), Err(Error::Closed)));
}

#[test]
fn values_cross_a_buffered_pipe() -> anyhow::Result<()> {
    init_logging();
    let (writer, reader) = pipe_with_capacity::<u8>(32)?;

    let producer = thread::spawn(move || -> pipestreams::Result<()> {
        let mut sink = BufferedSink::with_capacity(16, writer)?;
        for i in 0..500 {
            sink.write_i32(i * 1000)?;
            sink.write_utf(&format!("record {}", i))?;
        }
        sink.write_bool(false)?;
        sink.close()
    });

    let mut source = BufferedSource::with_capacity(24, reader)?;
    for i in 0..500 {
        assert_eq!(source.read_i32()?, i * 1000);
        assert_eq!(source.read_utf()?, format!("record {}", i));
    }
    assert!(!source.read_bool()?);
    assert!(matches!(source.read_u8(), Err(Error::UnexpectedEof)));
    producer.join().unwrap()?;
    Ok(())
}

#[test]
fn mark_and_reset_over_a_pipe() -> anyhow::Result<()> {
    init_logging();
    let (mut writer, reader) = pipe_with_capacity::<u8>(8)?;
    let data = pattern(256);
    let expected = data.clone();
    let producer = thread::spawn(move || writer.write(&data));

    let mut source = BufferedSource::with_capacity(4, reader)?;
    source.mark(64);
    let first = take(&mut source, 64);
    source.reset()?;
    assert_eq!(take(&mut source, 64), first);

    let mut rest = Vec::new();
    Source::read_to_end(&mut source, &mut rest)?;
    assert_eq!(rest, &expected[64..]);
    producer.join().unwrap()?;
    Ok(())
}
