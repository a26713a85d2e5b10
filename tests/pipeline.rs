//! End-to-end pipeline tests: press capture through wire records,
//! with faked capture, link and transport collaborators. All workers
//! run cooperatively under a single `block_on`, raced against a test
//! script that drives presses and link events.

mod common;

use embassy_futures::block_on;
use embassy_futures::select::{select, select4, Either, Either4};
use embassy_futures::yield_now;
use embassy_time::Duration;

use btn2net::command::{ActuatorId, ButtonId, ButtonRoles, Command};
use btn2net::link::{link_monitor, ConnectionState, LinkEvent};
use btn2net::transmitter::{transmitter, TxGate};
use btn2net::{builder::command_builder, RemoteSwitch, StartPolicy, SwitchContext};

use common::{FakeAssociate, FakeCapture, FakeLink, FakeTransport, TransportCtrl};

fn fast_policy() -> StartPolicy {
    StartPolicy {
        retries: 200,
        poll: Duration::from_millis(1),
    }
}

/// Yield until the wire holds `n` completed records.
async fn wait_for_records(ctrl: &TransportCtrl, n: usize) {
    while ctrl.wire.borrow().len() < n {
        yield_now().await;
    }
}

#[test]
fn primary_press_reaches_the_wire_as_toggle_record() {
    let ctx: SwitchContext = SwitchContext::new();
    let assoc = FakeAssociate::default();
    let ctrl = TransportCtrl::new();
    let mut transport = FakeTransport::new(&ctrl);

    let link = FakeLink::new(&ctx, vec![LinkEvent::Started, LinkEvent::AddressAssigned]);
    let mut switch =
        RemoteSwitch::new(&ctx, FakeCapture::new(), link).with_start_policy(fast_policy());
    switch.init(ButtonId::Button0).unwrap();

    let script = async {
        switch.start_transport().await.unwrap();
        ctx.record_press(ButtonId::Button0);
        wait_for_records(&ctrl, 1).await;
    };

    let outcome = block_on(select4(
        link_monitor(&ctx, &assoc),
        transmitter(&ctx, &mut transport),
        command_builder(&ctx, ButtonRoles::default()),
        script,
    ));

    assert!(matches!(outcome, Either4::Fourth(())));
    assert_eq!(ctrl.records(), vec![vec![0, 0, 0]]);
    // Started and Lost both request association; here only Started did.
    assert_eq!(*assoc.requests.borrow(), 1);
}

#[test]
fn secondary_presses_ramp_the_level() {
    let ctx: SwitchContext = SwitchContext::new();
    let assoc = FakeAssociate::default();
    let ctrl = TransportCtrl::new();
    let mut transport = FakeTransport::new(&ctrl);

    let link = FakeLink::new(&ctx, vec![LinkEvent::Started, LinkEvent::AddressAssigned]);
    let mut switch =
        RemoteSwitch::new(&ctx, FakeCapture::new(), link).with_start_policy(fast_policy());
    switch.init(ButtonId::Button1).unwrap();

    let script = async {
        switch.start_transport().await.unwrap();
        // Paced presses: the wake signal collapses rapid ones, so wait
        // for each record before the next press.
        for n in 1..=5 {
            ctx.record_press(ButtonId::Button1);
            wait_for_records(&ctrl, n).await;
        }
    };

    let outcome = block_on(select4(
        link_monitor(&ctx, &assoc),
        transmitter(&ctx, &mut transport),
        command_builder(&ctx, ButtonRoles::default()),
        script,
    ));

    assert!(matches!(outcome, Either4::Fourth(())));
    let records = ctrl.records();
    let levels: Vec<u8> = records.iter().map(|record| record[2]).collect();
    assert_eq!(levels, [20, 30, 40, 50, 60]);
    for record in &records {
        assert_eq!(&record[..2], &[0, 1], "SetLevel record for Lamp0");
    }
}

#[test]
fn commands_queued_across_link_loss_are_sent_after_reconnect() {
    let ctx: SwitchContext = SwitchContext::new();
    let assoc = FakeAssociate::default();
    let ctrl = TransportCtrl::new();
    let mut transport = FakeTransport::new(&ctrl);

    let link = FakeLink::new(&ctx, vec![LinkEvent::Started, LinkEvent::AddressAssigned]);
    let mut switch =
        RemoteSwitch::new(&ctx, FakeCapture::new(), link).with_start_policy(fast_policy());
    switch.init(ButtonId::Button0).unwrap();

    let bound = Duration::from_millis(10);

    let script = async {
        switch.start_transport().await.unwrap();

        // Drop the link and wait for the monitor to act on it.
        ctx.post_link_event(LinkEvent::Lost);
        while ctx.link_state.get(bound).await.unwrap() != ConnectionState::Disconnected {
            yield_now().await;
        }

        // A command still in flight when the link dropped: queue it
        // directly, as the builder would have before the loss.
        ctx.queue
            .enqueue(Command::toggle(ActuatorId::Lamp0), Duration::from_millis(0))
            .await
            .unwrap();

        // The stopped transmitter must not touch it.
        for _ in 0..50 {
            yield_now().await;
        }
        assert!(ctrl.wire.borrow().is_empty());
        assert_eq!(ctx.queue.len(), 1);

        // Reconnect; the queued command drains.
        ctx.post_link_event(LinkEvent::Started);
        ctx.post_link_event(LinkEvent::AddressAssigned);
        wait_for_records(&ctrl, 1).await;
    };

    let outcome = block_on(select4(
        link_monitor(&ctx, &assoc),
        transmitter(&ctx, &mut transport),
        command_builder(&ctx, ButtonRoles::default()),
        script,
    ));

    assert!(matches!(outcome, Either4::Fourth(())));
    assert_eq!(ctrl.records(), vec![vec![0, 0, 0]]);
    assert!(ctx.queue.is_empty());
    // Started twice plus one Lost.
    assert_eq!(*assoc.requests.borrow(), 3);
}

#[test]
fn rapid_connect_then_loss_leaves_commands_queued() {
    let ctx: SwitchContext = SwitchContext::new();
    let assoc = FakeAssociate::default();
    let ctrl = TransportCtrl::new();
    let mut transport = FakeTransport::new(&ctrl);

    let bound = Duration::from_millis(10);

    // The whole connect-then-loss burst lands before the transmitter
    // ever polls, together with a command enqueued in between.
    ctx.post_link_event(LinkEvent::Started);
    ctx.post_link_event(LinkEvent::AddressAssigned);
    ctx.post_link_event(LinkEvent::Lost);
    block_on(
        ctx.queue
            .enqueue(Command::toggle(ActuatorId::Lamp0), Duration::from_millis(0)),
    )
    .unwrap();

    // Phase 1: the monitor digests the burst on its own. Started and
    // Lost each request association, so two requests mean all three
    // events went through the machine.
    let outcome = block_on(select(link_monitor(&ctx, &assoc), async {
        while *assoc.requests.borrow() < 2 {
            yield_now().await;
        }
        assert_eq!(
            ctx.link_state.get(bound).await.unwrap(),
            ConnectionState::Disconnected
        );
    }));
    assert!(matches!(outcome, Either::Second(())));

    // Phase 2: the transmitter wakes up and must see only the collapsed
    // stop, not the stale run.
    let outcome = block_on(select(transmitter(&ctx, &mut transport), async {
        for _ in 0..50 {
            yield_now().await;
        }
    }));
    assert!(matches!(outcome, Either::Second(())));

    assert!(ctrl.wire.borrow().is_empty());
    assert_eq!(ctx.queue.len(), 1, "command must survive for reconnect");
}

#[test]
fn gateway_resolution_retries_until_an_address_appears() {
    let ctx: SwitchContext = SwitchContext::new();
    let ctrl = TransportCtrl::new();
    ctrl.fail_gateway.set(true);
    let mut transport = FakeTransport::new(&ctrl);

    block_on(
        ctx.queue
            .enqueue(Command::toggle(ActuatorId::Lamp0), Duration::from_millis(0)),
    )
    .unwrap();
    ctx.tx_gate.signal(TxGate::Run);

    let outcome = block_on(select(transmitter(&ctx, &mut transport), async {
        while ctrl.gateway_calls.get() == 0 {
            yield_now().await;
        }
        // The address shows up; a fresh run value short-circuits the
        // retry backoff.
        ctrl.fail_gateway.set(false);
        ctx.tx_gate.signal(TxGate::Run);
        wait_for_records(&ctrl, 1).await;
    }));
    assert!(matches!(outcome, Either::Second(())));

    assert!(ctrl.gateway_calls.get() >= 2);
    assert_eq!(ctrl.records(), vec![vec![0, 0, 0]]);
    assert!(ctx.queue.is_empty());
}

#[test]
fn failed_connect_drops_the_command() {
    let ctx: SwitchContext = SwitchContext::new();
    let assoc = FakeAssociate::default();
    let ctrl = TransportCtrl::new();
    ctrl.fail_connect.set(true);
    let mut transport = FakeTransport::new(&ctrl);

    let link = FakeLink::new(&ctx, vec![LinkEvent::Started, LinkEvent::AddressAssigned]);
    let mut switch =
        RemoteSwitch::new(&ctx, FakeCapture::new(), link).with_start_policy(fast_policy());
    switch.init(ButtonId::Button0).unwrap();

    let script = async {
        switch.start_transport().await.unwrap();
        ctx.record_press(ButtonId::Button0);
        // Wait for the transmitter to take the command, then give it
        // time to attempt the connect.
        while !ctx.queue.is_empty() {
            yield_now().await;
        }
        for _ in 0..50 {
            yield_now().await;
        }
    };

    let outcome = block_on(select4(
        link_monitor(&ctx, &assoc),
        transmitter(&ctx, &mut transport),
        command_builder(&ctx, ButtonRoles::default()),
        script,
    ));

    assert!(matches!(outcome, Either4::Fourth(())));
    // The command is gone, not retried and not re-queued.
    assert_eq!(ctrl.connects.get(), 1);
    assert!(ctrl.wire.borrow().is_empty());
    assert!(ctx.queue.is_empty());
}
