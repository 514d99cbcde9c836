//! Buffer flow specs
//!
//! Verify producer/consumer hand-off through the bounded buffer.

use crate::prelude::*;

#[test]
fn records_flow_from_producer_to_consumer_in_order() {
    let buffer = Arc::new(BlockingBuffer::new(4, 3).unwrap());

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for i in 0..20u32 {
                buffer
                    .write(Record::new(i), Duration::from_secs(5))
                    .unwrap();
            }
        })
    };

    let mut received = Vec::new();
    while received.len() < 20 {
        let batch = buffer.read(Duration::from_millis(50));
        assert!(batch.len() <= 3);
        received.extend(batch.into_iter().map(Record::into_data));
    }
    producer.join().unwrap();

    assert_eq!(received, (0..20).collect::<Vec<_>>());
}

#[test]
fn full_buffer_hands_record_back_to_source() {
    let buffer = BlockingBuffer::new(1, 1).unwrap();
    buffer
        .write(Record::new("first"), Duration::ZERO)
        .unwrap();

    let rejected = buffer
        .write(Record::new("second"), Duration::from_millis(20))
        .unwrap_err();

    assert_eq!(rejected.timeout(), Duration::from_millis(20));
    assert_eq!(rejected.into_record().into_data(), "second");
    assert_eq!(
        buffer
            .read(Duration::ZERO)
            .into_iter()
            .map(Record::into_data)
            .collect::<Vec<_>>(),
        vec!["first"]
    );
}

#[test]
fn consumer_gets_partial_batch_on_timeout() {
    let buffer = BlockingBuffer::new(8, 4).unwrap();
    buffer.write(Record::new(1), Duration::ZERO).unwrap();
    buffer.write(Record::new(2), Duration::ZERO).unwrap();

    let batch = buffer.read(Duration::from_millis(10));

    assert_eq!(batch.len(), 2);
    assert!(buffer.read(Duration::from_millis(10)).is_empty());
}
