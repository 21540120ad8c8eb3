#![allow(missing_docs)]
#![cfg(feature = "loom")]

use loom::sync::Arc;
use loom::thread;
use scatter_join::{barrier::AllDoneBarrier, notifier::MultiEventNotifier};

#[test]
fn loom_notifier_no_lost_wakeup_two_producers() {
    loom::model(|| {
        // Two producers post concurrently with the consumer's drain/gate
        // reset. The model explores every interleaving, including a post
        // landing between the last drain and the gate reset; the consumer
        // must terminate and collect both results exactly once.
        let notifier = Arc::new(MultiEventNotifier::new(2));

        let producers: Vec<_> = [(0u32, 5u64), (1u32, 7u64)]
            .into_iter()
            .map(|(position, value)| {
                let notifier = notifier.clone();
                thread::spawn(move || notifier.post(position, value))
            })
            .collect();

        let mut seen = vec![None; 2];
        notifier.wait_and_drain(|position, value| {
            assert!(
                seen[position as usize].replace(value).is_none(),
                "position {position} delivered twice"
            );
        });

        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(seen, vec![Some(5), Some(7)]);
        assert_eq!(notifier.outstanding(), 0);
    });
}

#[test]
fn loom_notifier_slot_value_never_observed_stale() {
    loom::model(|| {
        // A slot observed as set must carry exactly the posted value, never
        // the default: guards against store/flag reordering.
        let notifier = Arc::new(MultiEventNotifier::new(1));

        let producer = {
            let notifier = notifier.clone();
            thread::spawn(move || notifier.post(0, 42))
        };

        let mut drained = Vec::new();
        notifier.wait_and_drain(|position, value| drained.push((position, value)));
        producer.join().unwrap();

        assert_eq!(drained, vec![(0, 42)]);
    });
}

#[test]
fn loom_barrier_releases_only_after_last_arrival() {
    loom::model(|| {
        let barrier = Arc::new(AllDoneBarrier::new(2));
        let done = Arc::new(loom::sync::atomic::AtomicUsize::new(0));

        let arrivals: Vec<_> = (0..2)
            .map(|_| {
                let barrier = barrier.clone();
                let done = done.clone();
                thread::spawn(move || {
                    done.fetch_add(1, loom::sync::atomic::Ordering::Relaxed);
                    barrier.arrive();
                })
            })
            .collect();

        barrier.await_all();
        // Both arrivals happened-before the release.
        assert_eq!(done.load(loom::sync::atomic::Ordering::Relaxed), 2);
        assert_eq!(barrier.outstanding(), 0);

        for arrival in arrivals {
            arrival.join().unwrap();
        }
    });
}
