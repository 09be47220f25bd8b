#[cfg(all(loom, test))]
mod loom_model {
    use loom::sync::Arc;
    use loom::thread;
    use promise_cell::Promise;

    #[test]
    fn completer_vs_waiter() {
        loom::model(|| {
            let promise = Arc::new(Promise::<u32>::new());

            let p = promise.clone();
            let producer = thread::spawn(move || {
                p.complete(7).unwrap();
            });

            // every interleaving of register/park against settle/wake must
            // deliver the value; a lost wakeup deadlocks the model here
            assert_eq!(*promise.wait().unwrap(), 7);
            producer.join().unwrap();
        });
    }

    #[test]
    fn racing_completers_single_assignment() {
        loom::model(|| {
            let promise = Arc::new(Promise::<u32>::new());

            let p = promise.clone();
            let first = thread::spawn(move || p.complete(1).is_ok());
            let p = promise.clone();
            let second = thread::spawn(move || p.complete(2).is_ok());

            let first_won = first.join().unwrap();
            let second_won = second.join().unwrap();
            assert!(first_won ^ second_won);

            let settled = *promise.wait().unwrap();
            assert_eq!(settled, if first_won { 1 } else { 2 });
        });
    }

    #[test]
    fn failure_propagates_to_waiter() {
        loom::model(|| {
            let promise = Arc::new(Promise::<u32, &str>::new());

            let p = promise.clone();
            let producer = thread::spawn(move || p.fail("err").unwrap());

            assert_eq!(promise.wait().unwrap_err(), &"err");
            producer.join().unwrap();
        });
    }

    #[test]
    fn observer_never_sees_partial_outcome() {
        loom::model(|| {
            let promise = Arc::new(Promise::<u32>::new());

            let p = promise.clone();
            let producer = thread::spawn(move || p.complete(3).unwrap());

            // a racing non-blocking read sees nothing or the final value
            if let Some(outcome) = promise.try_get() {
                assert_eq!(outcome, Ok(&3));
            }
            producer.join().unwrap();
        });
    }
}
