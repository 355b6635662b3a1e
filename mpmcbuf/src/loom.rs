#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::Queue;
    use loom::{model::Builder, sync::Arc, thread};

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    #[test]
    fn test_two_producers_one_consumer() {
        builder().check(|| {
            let queue = Arc::new(Queue::with_capacity(4).unwrap());

            let handles: Vec<_> = (0..2)
                .map(|producer_id| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        for i in 0..2 {
                            assert!(queue.push(producer_id * 10 + i).is_ok());
                        }
                    })
                })
                .collect();

            let mut received = vec![];
            while let Some(value) = queue.pop() {
                received.push(value);
            }

            for handle in handles {
                handle.join().unwrap();
            }
            while let Some(value) = queue.pop() {
                received.push(value);
            }

            received.sort_unstable();
            assert_eq!(received, vec![0, 1, 10, 11]);
        });
    }

    #[test]
    fn test_one_producer_two_consumers() {
        builder().check(|| {
            let queue = Arc::new(Queue::with_capacity(2).unwrap());

            let consumers: Vec<_> = (0..2)
                .map(|_| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        let mut taken = vec![];
                        if let Some(value) = queue.pop() {
                            taken.push(value);
                        }
                        taken
                    })
                })
                .collect();

            let mut pushed = vec![];
            for value in 1..=3 {
                if queue.push(value).is_ok() {
                    pushed.push(value);
                }
            }

            let mut received: Vec<i32> = consumers
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect();
            while let Some(value) = queue.pop() {
                received.push(value);
            }

            received.sort_unstable();
            assert_eq!(received, pushed);
        });
    }

    #[test]
    fn test_full_queue_rejects_without_blocking() {
        builder().check(|| {
            let queue = Arc::new(Queue::with_capacity(2).unwrap());
            assert!(queue.push(1u8).is_ok());
            assert!(queue.push(2u8).is_ok());

            let producer = {
                let queue = queue.clone();
                thread::spawn(move || queue.push(3u8).is_ok())
            };

            let first = queue.pop();
            let accepted = producer.join().unwrap();

            assert_eq!(first, Some(1));
            let rest: Vec<u8> = queue.drain().collect();
            if accepted {
                assert_eq!(rest, vec![2, 3]);
            } else {
                assert_eq!(rest, vec![2]);
            }
        });
    }
}
