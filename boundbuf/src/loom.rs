#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{BoundedBuffer, PutOutcome, TakeOutcome};
    use loom::{model::Builder, sync::Arc, thread};

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    #[test]
    fn test_shutdown_wakes_blocked_consumer() {
        builder().check(|| {
            let buffer = Arc::new(BoundedBuffer::<u64>::new(1).unwrap());

            let consumer = {
                let buffer = buffer.clone();
                thread::spawn(move || buffer.take())
            };

            buffer.trigger_shutdown();

            assert_eq!(consumer.join().unwrap(), TakeOutcome::Drained);
        });
    }

    #[test]
    fn test_shutdown_rejects_blocked_producer() {
        builder().check(|| {
            let buffer = Arc::new(BoundedBuffer::<u64>::new(1).unwrap());
            assert_eq!(buffer.put(1), PutOutcome::Stored { count: 1 });

            let producer = {
                let buffer = buffer.clone();
                thread::spawn(move || buffer.put(2))
            };

            buffer.trigger_shutdown();

            assert_eq!(producer.join().unwrap(), PutOutcome::Rejected(2));
            assert_eq!(buffer.snapshot().count, 1);
        });
    }

    #[test]
    fn test_single_producer_single_consumer() {
        builder().check(|| {
            let buffer = Arc::new(BoundedBuffer::<u64>::new(1).unwrap());

            let producer = {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for value in 1..=2 {
                        assert!(matches!(buffer.put(value), PutOutcome::Stored { .. }));
                    }
                    buffer.trigger_shutdown();
                })
            };

            let mut received = vec![];
            while let TakeOutcome::Taken { value, .. } = buffer.take() {
                received.push(value);
            }

            producer.join().unwrap();

            assert_eq!(received, vec![1, 2]);
            let snapshot = buffer.snapshot();
            assert_eq!(snapshot.produced, 2);
            assert_eq!(snapshot.consumed, 2);
        });
    }

    #[test]
    fn test_two_consumers_drain_after_shutdown() {
        builder().check(|| {
            let buffer = Arc::new(BoundedBuffer::<u64>::new(2).unwrap());

            let consumers: Vec<_> = (0..2)
                .map(|_| {
                    let buffer = buffer.clone();
                    thread::spawn(move || {
                        let mut taken = 0;
                        while let TakeOutcome::Taken { .. } = buffer.take() {
                            taken += 1;
                        }
                        taken
                    })
                })
                .collect();

            let _ = buffer.put(1);
            let _ = buffer.put(2);
            buffer.trigger_shutdown();

            let taken: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
            assert_eq!(taken, 2);
            assert_eq!(buffer.snapshot().count, 0);
        });
    }
}
