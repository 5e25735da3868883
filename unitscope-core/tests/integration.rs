//! Integration Tests for the Registrar
//!
//! These tests drive getters, hooks and maintenance together through
//! execution contexts, including across threads and `.await` points.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use unitscope_core::context::{run_in_context, ExecutionContext};
use unitscope_core::registrar::{clean, expose, HookSet, Registrar, UnitRef};
use unitscope_core::unit::{Effect, Event, Store, Unit, UnitKind};
use unitscope_core::{BoxError, RegistrarError};

/// Records every hook call as (hook, label, unit).
fn recording_registrar() -> (Registrar, Arc<Mutex<Vec<(&'static str, String, UnitRef)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));

    let (events, effects, stores) = (calls.clone(), calls.clone(), calls.clone());
    let hooks = HookSet::new(
        move |label, unit| {
            events.lock().push(("event", label.to_owned(), unit.clone()));
            Ok(())
        },
        move |label, unit| {
            effects.lock().push(("effect", label.to_owned(), unit.clone()));
            Ok(())
        },
        move |label, unit| {
            stores.lock().push(("store", label.to_owned(), unit.clone()));
            Ok(())
        },
    );

    (Registrar::new(hooks), calls)
}

/// An action-producing factory triggers only the event hook.
#[test]
fn on_create_event_receives_label_and_unit() {
    let (registrar, calls) = recording_registrar();
    let get_event = registrar.register("event", |_: ()| Event::<()>::new());

    run_in_context(|| {
        let event = get_event.get().unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);

        let (hook, label, unit) = &calls[0];
        assert_eq!(*hook, "event");
        assert_eq!(label, "event");
        assert_eq!(unit.kind(), UnitKind::Action);
        assert!(unit.downcast::<Event<()>>().unwrap().same_unit(&event));
        assert_eq!(event.sid().as_deref(), Some("event"));
    });
}

#[test]
fn on_create_effect_receives_label_and_unit() {
    let (registrar, calls) = recording_registrar();
    let get_effect = registrar.register("effect", |_: ()| {
        Effect::new(|n: u32| async move { Ok::<_, BoxError>(n) })
    });

    run_in_context(|| {
        let effect = get_effect.get().unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);

        let (hook, label, unit) = &calls[0];
        assert_eq!(*hook, "effect");
        assert_eq!(label, "effect");
        assert_eq!(unit.kind(), UnitKind::EffectWrapper);
        assert!(unit.downcast::<Effect<u32, u32>>().unwrap().same_unit(&effect));
        assert_eq!(effect.sid().as_deref(), Some("effect"));
    });
}

/// Scenario: a "counter" store is created once and hooked once.
#[test]
fn counter_store_is_created_and_hooked_once() {
    let (registrar, calls) = recording_registrar();
    let get_counter = registrar.register("counter", |_: ()| Store::new(0));

    run_in_context(|| {
        let first = get_counter.get().unwrap();
        assert_eq!(first.get(), 0);
        assert_eq!(first.sid().as_deref(), Some("counter"));

        let second = get_counter.get().unwrap();
        assert!(first.same_unit(&second));
    });

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    let (hook, label, unit) = &calls[0];
    assert_eq!(*hook, "store");
    assert_eq!(label, "counter");
    assert!(unit.is::<Store<i32>>());
}

/// Scenario: arguments only matter on the creating call.
#[test]
fn later_arguments_are_ignored() {
    let registrar = Registrar::default();
    let get_store = registrar.register("n", |n: i32| Store::new(n));

    run_in_context(|| {
        assert_eq!(get_store.call(5).unwrap().get(), 5);
        assert_eq!(get_store.call(9).unwrap().get(), 5);
    });
}

#[test]
fn contexts_cache_independently() {
    let (registrar, calls) = recording_registrar();
    let creations = Arc::new(AtomicI32::new(0));

    let creations_clone = creations.clone();
    let get_store = registrar.register("shared", move |_: ()| {
        creations_clone.fetch_add(1, Ordering::SeqCst);
        Store::new(0)
    });

    let a = ExecutionContext::new();
    let b = ExecutionContext::new();

    let store_a = a.run(|| get_store.get().unwrap());
    let store_b = b.run(|| get_store.get().unwrap());

    assert!(!store_a.same_unit(&store_b));
    assert!(a.run(|| get_store.get().unwrap()).same_unit(&store_a));
    assert_eq!(creations.load(Ordering::SeqCst), 2);
    assert_eq!(calls.lock().len(), 2);
}

#[test]
fn everything_fails_outside_context() {
    let registrar = Registrar::default();
    let get_store = registrar.register("", |_: ()| Store::new(()));

    assert!(get_store.get().unwrap_err().is_no_active_context());
    assert!(clean().unwrap_err().is_no_active_context());
    assert!(expose().unwrap_err().is_no_active_context());
}

/// Units handed out before a clean keep working.
#[test]
fn clean_keeps_existing_units_alive() {
    let registrar = Registrar::default();
    let get_event = registrar.register("event", |_: ()| Event::<()>::new());

    let event_getter = get_event.clone();
    let get_store = registrar.register_fallible("store", move |_: ()| {
        let event = event_getter.get()?;
        Ok::<_, RegistrarError>(Store::new(0).on(&event, |n, _| n + 1))
    });

    run_in_context(|| {
        let event = get_event.get().unwrap();
        let store = get_store.get().unwrap();

        event.trigger(());
        clean().unwrap();
        event.trigger(());

        assert_eq!(store.get(), 2);

        // The registry itself starts over.
        assert!(expose().unwrap().is_empty());
        let fresh = get_store.get().unwrap();
        assert!(!fresh.same_unit(&store));
        assert_eq!(fresh.get(), 0);
    });
}

#[test]
fn expose_lists_units_in_creation_order() {
    let registrar = Registrar::default();
    let get_store = registrar.register("", |_: ()| Store::new(0));
    let get_event = registrar.register("clicked", |_: ()| Event::<()>::new());

    run_in_context(|| {
        get_store.get().unwrap();
        get_event.get().unwrap();
        get_store.get().unwrap();

        let units = expose().unwrap();
        assert_eq!(units.len(), 2);
        assert!(units[0].is::<Store<i32>>());
        assert_eq!(units[0].sid().as_deref(), Some(""));
        assert_eq!(units[1].kind(), UnitKind::Action);

        clean().unwrap();
        get_event.get().unwrap();

        let units = expose().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].label(), "clicked");
    });
}

/// A failing hook does not undo the creation.
#[test]
fn hook_error_keeps_unit_cached() {
    let hook_calls = Arc::new(AtomicI32::new(0));
    let hook_calls_clone = hook_calls.clone();
    let registrar = Registrar::new(
        HookSet::builder()
            .on_create_store(move |_, _| {
                hook_calls_clone.fetch_add(1, Ordering::SeqCst);
                Err("audit log unavailable".into())
            })
            .build(),
    );

    let factory_calls = Arc::new(AtomicI32::new(0));
    let factory_calls_clone = factory_calls.clone();
    let get_store = registrar.register("audited", move |_: ()| {
        factory_calls_clone.fetch_add(1, Ordering::SeqCst);
        Store::new(1)
    });

    run_in_context(|| {
        let err = get_store.get().unwrap_err();
        assert!(matches!(err, RegistrarError::Hook { ref label, .. } if label == "audited"));

        let store = get_store.get().unwrap();
        assert_eq!(store.get(), 1);
        assert_eq!(expose().unwrap().len(), 1);
    });

    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
}

/// Two threads sharing one context still create the unit once.
#[test]
fn shared_context_across_threads_creates_once() {
    let (registrar, calls) = recording_registrar();
    let creations = Arc::new(AtomicI32::new(0));

    let creations_clone = creations.clone();
    let get_store = registrar.register("shared", move |_: ()| {
        creations_clone.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        Store::new(0)
    });

    let context = ExecutionContext::new();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            let get_store = get_store.clone();
            std::thread::spawn(move || context.run(|| get_store.get().unwrap()))
        })
        .collect();

    let stores: Vec<Store<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(stores.iter().all(|s| s.same_unit(&stores[0])));
    assert_eq!(creations.load(Ordering::SeqCst), 1);
    assert_eq!(calls.lock().len(), 1);
}

/// The context follows a future across `.await` points and worker threads.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scoped_future_keeps_context_across_await() {
    let registrar = Registrar::default();
    let get_store = registrar.register("request", |_: ()| Store::new(0));

    let context = ExecutionContext::new();
    let task_getter = get_store.clone();
    let handle = tokio::spawn(context.scope(async move {
        let before = task_getter.get().unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let after = task_getter.get().unwrap();
        before.same_unit(&after)
    }));

    assert!(handle.await.unwrap());
    assert_eq!(context.run(|| expose().unwrap().len()), 1);
}

/// Spawned tasks do not inherit a context unless they are scoped.
#[tokio::test]
async fn unscoped_task_has_no_context() {
    let registrar = Registrar::default();
    let get_store = registrar.register("", |_: ()| Store::new(0));

    let context = ExecutionContext::new();
    let result = context
        .scope(async move {
            assert!(get_store.get().is_ok());

            let inner = get_store.clone();
            tokio::spawn(async move { inner.get().map(|_| ()) })
                .await
                .unwrap()
        })
        .await;

    assert!(result.unwrap_err().is_no_active_context());
}

/// Concurrent requests each get their own units.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_contexts_are_isolated() {
    let (registrar, calls) = recording_registrar();
    let get_store = registrar.register("per-request", |n: i32| Store::new(n));

    let tasks = (0..8).map(|n| {
        let get_store = get_store.clone();
        let context = ExecutionContext::new();
        tokio::spawn(context.scope(async move {
            let store = get_store.call(n).unwrap();
            tokio::task::yield_now().await;
            get_store.call(-1).unwrap().get() == store.get() && store.get() == n
        }))
    });

    let results = futures_util::future::join_all(tasks).await;
    assert!(results.into_iter().all(|r| r.unwrap()));
    assert_eq!(calls.lock().len(), 8);
}

/// An effect created through a getter can reach other getters when run
/// inside the context.
#[tokio::test]
async fn effect_handler_sees_context_when_scoped() {
    let registrar = Registrar::default();
    let get_total = registrar.register("total", |_: ()| Store::new(0));

    let total_getter = get_total.clone();
    let get_add = registrar.register("add", move |_: ()| {
        let total_getter = total_getter.clone();
        Effect::new(move |n: i32| {
            let result = total_getter.get().map(|total| total.update(|t| t + n));
            async move { result }
        })
    });

    let context = ExecutionContext::new();
    context
        .scope(async {
            let add = get_add.get().unwrap();
            add.run(2).await.unwrap();
            add.run(3).await.unwrap();
            assert_eq!(get_total.get().unwrap().get(), 5);
        })
        .await;

    let kinds: Vec<UnitKind> = context.run(|| expose().unwrap().iter().map(|u| u.kind()).collect());
    assert_eq!(kinds, vec![UnitKind::EffectWrapper, UnitKind::Store]);
}
