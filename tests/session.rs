//! End-to-end session tests against loopback mock servers

use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};
use stereo_link::protocol::{
    ACK_PAYLOAD, Message, TAG_ACK, TAG_CONTROL, TAG_VIDEO, TAG_VIDEO_RIGHT, TagSpace, read_message,
};
use stereo_link::{
    Error, EulerAngles, Eye, FrameSink, Result, Session, SessionConfig, SessionState, Topology,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Sink that keeps every frame it is handed
#[derive(Default)]
struct CollectingSink {
    frames: Vec<(Eye, Vec<u8>)>,
}

impl FrameSink for CollectingSink {
    fn submit_frame(&mut self, eye: Eye, frame: Vec<u8>) -> Result<()> {
        self.frames.push((eye, frame));
        Ok(())
    }
}

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn jpeg_payload() -> Vec<u8> {
    vec![0xFF, 0xD8, 1, 2, 3, 4, 5, 6, 7, 8, 0xFF, 0xD9]
}

fn send_frame(stream: &mut TcpStream, tag: u8, payload: &[u8]) {
    use std::io::Write;
    let bytes = Message::new(tag, payload.to_vec()).encode().unwrap();
    stream.write_all(&bytes).unwrap();
}

fn level() -> impl FnMut() -> EulerAngles {
    || EulerAngles::new(0.0, 0.0, 0.0)
}

/// Tick until `done` holds or the timeout expires
fn tick_until(
    session: &mut Session,
    sink: &mut CollectingSink,
    mut done: impl FnMut(&Session, &CollectingSink) -> bool,
) {
    let deadline = Instant::now() + TIMEOUT;
    let mut source = level();
    while !done(session, sink) {
        assert!(Instant::now() < deadline, "timed out waiting for session");
        session.tick(&mut source, sink).unwrap();
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn single_port_frame_is_acked_then_delivered_once() {
    let (listener, port) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        send_frame(&mut stream, TAG_VIDEO, &jpeg_payload());
        // Nothing else is written before the first tick
        let reply = read_message(&mut stream).unwrap();
        (stream, reply)
    });

    let config = SessionConfig {
        tag_space: Some(TagSpace::Combined),
        ..SessionConfig::default()
    };
    let mut session = Session::connect(&Topology::single("127.0.0.1", port), &config).unwrap();
    assert_eq!(session.state(), SessionState::Streaming);

    let (_stream, reply) = server.join().unwrap();
    assert_eq!(reply.tag, TAG_ACK);
    assert_eq!(reply.payload, ACK_PAYLOAD);

    let mut sink = CollectingSink::default();
    tick_until(&mut session, &mut sink, |_, sink| !sink.frames.is_empty());
    assert_eq!(sink.frames, vec![(Eye::Combined, jpeg_payload())]);

    // Consumed: further ticks deliver nothing
    let report = session.tick(&mut level(), &mut sink).unwrap();
    assert!(report.frames.is_empty());
    assert_eq!(sink.frames.len(), 1);

    session.shutdown().unwrap();
    let stats = session.stats();
    assert_eq!(stats.video_frames, 1);
    assert_eq!(stats.acks_sent, 1);
}

#[test]
fn single_port_stereo_tags_fill_both_eyes() {
    let (listener, port) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        send_frame(&mut stream, TAG_VIDEO, &[0xFF, 0xD8, 0x01]);
        send_frame(&mut stream, TAG_VIDEO_RIGHT, &[0xFF, 0xD8, 0x02]);
        let mut acks = 0;
        while acks < 2 {
            if read_message(&mut stream).unwrap().tag == TAG_ACK {
                acks += 1;
            }
        }
        stream
    });

    let mut session =
        Session::connect(&Topology::single("127.0.0.1", port), &SessionConfig::default()).unwrap();
    let _stream = server.join().unwrap();

    let mut sink = CollectingSink::default();
    tick_until(&mut session, &mut sink, |_, sink| sink.frames.len() >= 2);
    assert!(sink.frames.contains(&(Eye::Left, vec![0xFF, 0xD8, 0x01])));
    assert!(sink.frames.contains(&(Eye::Right, vec![0xFF, 0xD8, 0x02])));
}

#[test]
fn dual_port_control_goes_to_control_socket() {
    let (video_listener, video_port) = listener();
    let (control_listener, control_port) = listener();

    let video = thread::spawn(move || {
        let (mut stream, _) = video_listener.accept().unwrap();
        send_frame(&mut stream, TAG_VIDEO, &jpeg_payload());
        let ack = read_message(&mut stream).unwrap();
        (stream, ack)
    });
    let control = thread::spawn(move || {
        let (mut stream, _) = control_listener.accept().unwrap();
        read_message(&mut stream).unwrap()
    });

    let mut session = Session::connect(
        &Topology::dual("127.0.0.1", control_port, video_port),
        &SessionConfig::default(),
    )
    .unwrap();

    let mut source = || EulerAngles::new(350.0, 45.0, 0.0);
    let mut sink = CollectingSink::default();
    let report = session.tick(&mut source, &mut sink).unwrap();
    assert!(report.control_sent);

    let control_msg = control.join().unwrap();
    assert_eq!(control_msg.tag, TAG_CONTROL);
    assert_eq!(control_msg.payload, b"-10.0,45.0,0.0");

    let (_stream, ack) = video.join().unwrap();
    assert_eq!(ack.tag, TAG_ACK);

    tick_until(&mut session, &mut sink, |_, sink| !sink.frames.is_empty());
    assert_eq!(sink.frames[0], (Eye::Combined, jpeg_payload()));
}

#[test]
fn shutdown_interrupts_blocked_receiver() {
    let (listener, port) = listener();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        // Silent: hold the connection open until the client goes away
        let _ = read_message(&mut &stream);
    });

    let mut session =
        Session::connect(&Topology::single("127.0.0.1", port), &SessionConfig::default()).unwrap();
    assert!(session.is_receiving());

    let started = Instant::now();
    session.shutdown().unwrap();
    assert!(started.elapsed() < TIMEOUT);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_receiving());

    // Idempotent
    session.shutdown().unwrap();

    let mut sink = CollectingSink::default();
    assert!(matches!(
        session.tick(&mut level(), &mut sink),
        Err(Error::SessionClosed)
    ));

    server.join().unwrap();
}

#[test]
fn peer_close_stops_receiving_but_ticks_continue() {
    let (listener, port) = listener();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let mut session =
        Session::connect(&Topology::single("127.0.0.1", port), &SessionConfig::default()).unwrap();
    server.join().unwrap();

    let mut sink = CollectingSink::default();
    tick_until(&mut session, &mut sink, |session, _| !session.is_receiving());

    assert_eq!(session.state(), SessionState::Streaming);
    assert!(session.tick(&mut level(), &mut sink).is_ok());
    session.shutdown().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn connect_to_closed_port_fails() {
    let (listener, port) = listener();
    drop(listener);

    let result = Session::connect(&Topology::single("127.0.0.1", port), &SessionConfig::default());
    assert!(matches!(result, Err(Error::ConnectFailure { .. })));
}
