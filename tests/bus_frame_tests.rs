use fansim::bus::{
    BusFrame, FrameDirection, FrameGenerator, FrameLog, FRAME_DLC, FRAME_LOG_CAPACITY,
    RX_FRAME_ID, TX_FRAME_ID,
};
use fansim::controller::ControlMode;

fn pair(generator: &mut FrameGenerator) -> (BusFrame, BusFrame) {
    generator.generate(0, 512, 512, 50, ControlMode::Auto)
}

#[test]
fn frames_carry_fixed_identifiers_and_dlc() {
    let mut generator = FrameGenerator::new(0);
    let (tx, rx) = pair(&mut generator);

    assert_eq!(tx.direction, FrameDirection::Tx);
    assert_eq!(tx.id, TX_FRAME_ID);
    assert_eq!(tx.dlc, FRAME_DLC);
    assert_eq!(tx.payload.len(), 8);

    assert_eq!(rx.direction, FrameDirection::Rx);
    assert_eq!(rx.id, RX_FRAME_ID);
    assert_eq!(rx.dlc, FRAME_DLC);
    assert_eq!(rx.payload.len(), 8);
}

#[test]
fn tx_payload_encodes_raw_samples_high_byte_first() {
    let mut generator = FrameGenerator::new(0);
    let (tx, _) = generator.generate(0, 0x03FF, 0x0102, 0, ControlMode::Auto);

    assert_eq!(tx.payload[0], 0x03);
    assert_eq!(tx.payload[1], 0xFF);
    assert_eq!(tx.payload[2], 0x01);
    assert_eq!(tx.payload[3], 0x02);
    assert_eq!(tx.payload[4], 0, "first sequence number");
}

#[test]
fn rx_payload_encodes_duty_mode_and_sequence() {
    let mut generator = FrameGenerator::new(0);
    let (_, rx) = generator.generate(0, 512, 512, 75, ControlMode::Manual);

    assert_eq!(rx.payload[0], 75);
    assert_eq!(rx.payload[1], ControlMode::Manual.code());
    assert_eq!(rx.payload[2], 0);
    assert_eq!(&rx.payload[3..], &[0, 0, 0, 0, 0]);
}

#[test]
fn mode_codes_follow_declaration_order() {
    assert_eq!(ControlMode::Auto.code(), 0);
    assert_eq!(ControlMode::Manual.code(), 1);
    assert_eq!(ControlMode::Safety.code(), 2);
}

#[test]
fn sequence_increments_and_wraps_modulo_256() {
    let mut generator = FrameGenerator::new(0);
    for expected in 0..300u32 {
        let (tx, rx) = pair(&mut generator);
        assert_eq!(u32::from(tx.sequence()), expected % 256);
        assert_eq!(tx.sequence(), rx.sequence(), "pair shares one sequence");
    }
}

#[test]
fn stamps_are_relative_to_the_bus_epoch() {
    let mut generator = FrameGenerator::new(1_000);
    let (tx, _) = generator.generate(66_432, 0, 0, 0, ControlMode::Auto);
    assert_eq!(tx.stamp.as_str(), "01:05.432");
}

#[test]
fn reset_rewinds_sequence_and_epoch() {
    let mut generator = FrameGenerator::new(0);
    for _ in 0..10 {
        let _ = pair(&mut generator);
    }
    generator.reset(5_000);
    let (tx, _) = generator.generate(5_000, 0, 0, 0, ControlMode::Auto);
    assert_eq!(tx.sequence(), 0);
    assert_eq!(tx.stamp.as_str(), "00:00.000");
}

#[test]
fn log_never_exceeds_capacity_and_evicts_oldest_first() {
    let mut generator = FrameGenerator::new(0);
    let mut log = FrameLog::new();

    for _ in 0..120 {
        let (tx, rx) = pair(&mut generator);
        log.push(tx);
        log.push(rx);
    }

    assert_eq!(log.len(), FRAME_LOG_CAPACITY);
    assert_eq!(log.evicted(), 240 - FRAME_LOG_CAPACITY as u32);

    // 240 frames went in; the survivors are the most recent 100. Frame
    // number 140 (0-based) is the oldest left: pair 70, its TX half.
    let oldest = log.iter().next().expect("log is not empty");
    assert_eq!(oldest.direction, FrameDirection::Tx);
    assert_eq!(oldest.sequence(), 70);

    let newest = log.latest().expect("log is not empty");
    assert_eq!(newest.direction, FrameDirection::Rx);
    assert_eq!(newest.sequence(), 119);
}

#[test]
fn clear_empties_the_log() {
    let mut generator = FrameGenerator::new(0);
    let mut log = FrameLog::new();
    let (tx, rx) = pair(&mut generator);
    log.push(tx);
    log.push(rx);

    log.clear();
    assert!(log.is_empty());
    assert_eq!(log.evicted(), 0);
}
