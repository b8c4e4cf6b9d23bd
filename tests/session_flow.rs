mod common;

use common::*;
use flightdeck::channel::{ServerMessage, TransportEvent};
use flightdeck::domain::{
    Cursor, FilterPatch, FilterValue, FlightdeckError, QueryResponse, SortOrder,
};
use flightdeck::session::SessionOptions;
use flightdeck::storage::MemoryPreferences;

#[test]
fn pages_forward_and_records_cursors() {
    let (mut session, transport, _) = open_session();

    let first = only_sent(&transport);
    assert_eq!(first.query.cursor, None);
    assert_eq!(first.query.page_size, 50);
    assert!(first.query.filters.is_empty());

    deliver(&mut session, first.request_id, page(rows("DLH", 50), 5000, Some("c1")));
    let view = session.view().snapshot();
    assert_eq!(view.rows.len(), 50);
    assert_eq!(view.total_count, 5000);
    assert_eq!(view.page_index, 0);
    assert!(!view.is_loading);
    assert!(view.has_more);

    session.on_page_changed(1).unwrap();
    let second = only_sent(&transport);
    assert_eq!(second.query.cursor, Some(Cursor::from("c1")));
    assert!(session.view().snapshot().is_loading);

    deliver(&mut session, second.request_id, page(rows("BAW", 50), 5000, Some("c2")));
    assert_eq!(
        session.state().ledger().entries(),
        vec![
            (0, None),
            (1, Some(Cursor::from("c1"))),
            (2, Some(Cursor::from("c2"))),
        ]
    );
    assert_eq!(session.view().snapshot().page_index, 1);
    assert_eq!(first_callsign(&session).as_deref(), Some("BAW0"));
}

#[test]
fn going_back_reuses_the_recorded_cursor() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 5), 15, Some("c1")));

    session.on_page_changed(1).unwrap();
    let second = only_sent(&transport);
    deliver(&mut session, second.request_id, page(rows("B", 5), 15, Some("c2")));

    session.on_page_changed(0).unwrap();
    let back = only_sent(&transport);
    assert_eq!(back.query.cursor, None);
    assert_eq!(session.state().pending_page(), Some(0));
    deliver(&mut session, back.request_id, page(rows("A", 5), 15, Some("c1")));
    assert_eq!(session.state().page_index, 0);
}

#[test]
fn only_the_latest_request_updates_rows() {
    let (mut session, transport, _) = open_session();
    let t1 = only_sent(&transport).request_id;

    session.on_sort_changed("velocity", SortOrder::Descending).unwrap();
    let t2 = only_sent(&transport).request_id;
    session.on_page_size_changed(25).unwrap();
    let t3 = only_sent(&transport);
    assert_eq!(t3.query.page_size, 25);
    assert_eq!(t3.query.sort_field.as_deref(), Some("velocity"));

    deliver(&mut session, t1, page(rows("OLD", 50), 900, Some("x")));
    deliver(&mut session, t2, page(rows("OLDER", 50), 800, Some("y")));
    let view = session.view().snapshot();
    assert!(view.rows.is_empty());
    assert!(view.is_loading);

    deliver(&mut session, t3.request_id, page(rows("NEW", 25), 700, Some("z")));
    let view = session.view().snapshot();
    assert_eq!(view.rows.len(), 25);
    assert_eq!(view.total_count, 700);
    assert!(!view.is_loading);
}

#[test]
fn late_reply_to_a_superseded_request_is_ignored() {
    let (mut session, transport, _) = open_session();
    let a = only_sent(&transport).request_id;
    session.on_sort_changed("callsign", SortOrder::Ascending).unwrap();
    let b = only_sent(&transport).request_id;

    deliver(&mut session, b, page(rows("B", 3), 3, None));
    deliver(&mut session, a, page(rows("A", 9), 9, Some("a1")));

    let view = session.view().snapshot();
    assert_eq!(view.total_count, 3);
    assert_eq!(first_callsign(&session).as_deref(), Some("B0"));
    assert!(!view.has_more);
}

#[test]
fn query_issued_before_open_is_sent_once_in_order() {
    let (mut session, transport, _) = connecting_session();

    session.on_sort_changed("icao24", SortOrder::Ascending).unwrap();
    assert!(transport.sent().is_empty());
    assert_eq!(session.channel().queued(), 1);

    session.handle_transport_event(TransportEvent::Opened).unwrap();
    let sent = drain_sent(&transport);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].query.sort_field.as_deref(), Some("icao24"));
    assert!(sent[0].request_id < sent[1].request_id);
    assert_eq!(session.channel().queued(), 0);

    session.handle_transport_event(TransportEvent::Opened).unwrap();
    assert!(drain_sent(&transport).iter().all(|m| m.request_id > sent[1].request_id));
}

#[test]
fn reconnect_restarts_at_the_first_page() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 50), 200, Some("c1")));
    session.on_page_changed(1).unwrap();
    let pending = only_sent(&transport);

    session
        .handle_transport_event(TransportEvent::Closed { reason: Some("server restart".into()) })
        .unwrap();
    let view = session.view().snapshot();
    assert!(!view.is_loading);
    assert!(!view.is_connected);
    assert_eq!(view.rows.len(), 50, "last good rows stay visible");

    deliver(&mut session, pending.request_id, page(rows("LATE", 50), 200, Some("c2")));
    assert_eq!(first_callsign(&session).as_deref(), Some("A0"));

    let replacement = flightdeck::channel::MemoryTransport::new();
    session.connect(ADDRESS, replacement.clone()).unwrap();
    session.handle_transport_event(TransportEvent::Opened).unwrap();

    let restart = only_sent(&replacement);
    assert_eq!(restart.query.cursor, None);
    assert_eq!(session.state().page_index, 0);
    assert_eq!(session.state().ledger().entries(), vec![(0, None)]);
}

#[test]
fn server_error_keeps_previous_rows() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 10), 10, None));

    session.on_sort_changed("squawk", SortOrder::Ascending).unwrap();
    let failing = only_sent(&transport);
    deliver(&mut session, failing.request_id, QueryResponse::failure("no such column: squawk"));

    let view = session.view().snapshot();
    assert_eq!(view.error_message.as_deref(), Some("no such column: squawk"));
    assert_eq!(view.rows.len(), 10);
    assert_eq!(view.total_count, 10);
    assert!(!view.is_loading);

    session.on_page_changed(0).unwrap();
    let retry = only_sent(&transport);
    deliver(&mut session, retry.request_id, page(rows("C", 4), 4, None));
    assert_eq!(session.view().snapshot().error_message, None);
}

#[test]
fn failed_navigation_stays_on_the_shown_page() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("P0-", 50), 200, Some("c1")));

    session.on_page_changed(1).unwrap();
    let failing = only_sent(&transport);
    deliver(&mut session, failing.request_id, QueryResponse::failure("boom"));

    let view = session.view().snapshot();
    assert_eq!(view.page_index, 0);
    assert_eq!(view.error_message.as_deref(), Some("boom"));
    assert_eq!(first_callsign(&session).as_deref(), Some("P0-0"));

    session.on_refresh_tick().unwrap();
    assert_eq!(only_sent(&transport).query.cursor, None, "refresh re-requests the shown page");
}

#[test]
fn lost_connection_mid_navigation_stays_on_the_shown_page() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("P0-", 50), 200, Some("c1")));

    session.on_page_changed(1).unwrap();
    let _ = only_sent(&transport);
    session
        .handle_transport_event(TransportEvent::Closed { reason: None })
        .unwrap();

    let view = session.view().snapshot();
    assert_eq!(view.page_index, 0);
    assert_eq!(session.state().pending_page(), None);
    assert_eq!(first_callsign(&session).as_deref(), Some("P0-0"));
}

#[test]
fn replacing_an_open_transport_counts_as_a_lost_connection() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 50), 200, Some("c1")));
    session.on_page_changed(1).unwrap();
    let pending = only_sent(&transport);

    let replacement = flightdeck::channel::MemoryTransport::new();
    session.connect(ADDRESS, replacement.clone()).unwrap();
    assert!(transport.is_closed());

    let view = session.view().snapshot();
    assert!(!view.is_connected);
    assert!(!view.is_loading);
    assert_eq!(session.state().connected, session.channel().is_ready());

    session.on_refresh_tick().unwrap();
    assert!(!session.view().snapshot().is_loading);
    assert_eq!(session.channel().queued(), 0);

    deliver(&mut session, pending.request_id, page(rows("LATE", 50), 200, None));
    assert_eq!(first_callsign(&session).as_deref(), Some("A0"));

    session.handle_transport_event(TransportEvent::Opened).unwrap();
    assert_eq!(only_sent(&replacement).query.cursor, None);
    assert!(session.view().snapshot().is_connected);
}

#[test]
fn connecting_after_teardown_fails() {
    let (mut session, _, _) = open_session();
    session.teardown().unwrap();
    assert!(matches!(
        session.connect(ADDRESS, flightdeck::channel::MemoryTransport::new()),
        Err(FlightdeckError::SessionClosed)
    ));
}

#[test]
fn malformed_frames_never_reach_the_view() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);
    let before = session.view().snapshot();

    for frame in ["garbage", "{}", "[]", r#"{"results": "nope"}"#] {
        session
            .handle_transport_event(TransportEvent::Text(frame.to_string()))
            .unwrap();
    }
    assert_eq!(*session.view().snapshot(), *before);
    assert!(session.channel().is_ready());

    deliver(&mut session, first.request_id, page(rows("OK", 2), 2, None));
    assert_eq!(session.view().snapshot().rows.len(), 2);
}

#[test]
fn filter_edits_are_debounced_into_one_query() {
    let (mut session, transport, timers) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 50), 5000, Some("c1")));
    session.on_page_changed(1).unwrap();
    let _ = drain_sent(&transport);

    let edits = [
        ("origin_country", FilterValue::Text("Germany".into())),
        ("on_ground", FilterValue::Bool(false)),
        ("baro_altitude_gt", FilterValue::Number(3000.into())),
        ("baro_altitude_gt", FilterValue::Number(9000.into())),
    ];
    for (key, value) in edits {
        session
            .on_filter_changed(FilterPatch::from([(key.to_string(), Some(value))]))
            .unwrap();
    }
    let scheduled = timers.scheduled();
    assert_eq!(scheduled.len(), 4);
    assert!(transport.sent().is_empty());

    for (generation, _) in &scheduled[..3] {
        session.handle_timer(*generation).unwrap();
    }
    assert!(transport.sent().is_empty());

    session.handle_timer(timers.last_generation().unwrap()).unwrap();
    let query = only_sent(&transport);
    assert_eq!(query.query.cursor, None);
    assert_eq!(query.query.filters.len(), 3);
    assert_eq!(
        query.query.filters.get("baro_altitude_gt"),
        Some(&FilterValue::Number(9000.into()))
    );
    assert_eq!(session.state().pending_page(), Some(0));
}

#[test]
fn settling_unchanged_filters_still_restarts() {
    let (mut session, transport, timers) = open_session();
    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 50), 5000, Some("c1")));
    session.on_page_changed(1).unwrap();
    let second = only_sent(&transport);
    deliver(&mut session, second.request_id, page(rows("B", 50), 5000, Some("c2")));

    session.on_filter_changed(FilterPatch::new()).unwrap();
    session.handle_timer(timers.last_generation().unwrap()).unwrap();

    let restart = only_sent(&transport);
    assert_eq!(restart.query.cursor, None);
    assert_eq!(session.state().ledger().entries(), vec![(0, None)]);
}

#[test]
fn failed_send_marks_the_session_disconnected() {
    let (mut session, transport, _) = open_session();
    let _ = drain_sent(&transport);
    transport.set_failing(true);

    session.on_page_size_changed(10).unwrap();
    let view = session.view().snapshot();
    assert!(!view.is_connected);
    assert!(!view.is_loading);
    assert!(!session.channel().is_ready());
}

#[test]
fn invalid_inputs_are_rejected_without_side_effects() {
    let (mut session, transport, _) = open_session();
    let _ = drain_sent(&transport);

    assert!(matches!(
        session.on_page_size_changed(0),
        Err(FlightdeckError::InvalidInput(_))
    ));
    assert!(matches!(
        session.on_sort_changed("airspeed", SortOrder::Ascending),
        Err(FlightdeckError::InvalidInput(_))
    ));
    assert!(transport.sent().is_empty());
    assert_eq!(session.state().page_size, 50);
}

#[test]
fn teardown_closes_everything_once() {
    let (mut session, transport, timers) = open_session();
    let first = only_sent(&transport);

    session.teardown().unwrap();
    assert!(transport.is_closed());
    assert_eq!(timers.cancellations(), 1);
    assert!(!session.view().snapshot().is_loading);

    assert!(matches!(session.on_page_changed(1), Err(FlightdeckError::SessionClosed)));
    deliver(&mut session, first.request_id, page(rows("A", 5), 5, None));
    assert!(session.view().snapshot().rows.is_empty());

    session.teardown().unwrap();
    assert_eq!(timers.cancellations(), 1);
}

#[test]
fn refresh_requeries_the_current_page_when_idle() {
    let (mut session, transport, _) = open_session();
    let first = only_sent(&transport);

    session.on_refresh_tick().unwrap();
    assert!(transport.sent().is_empty(), "no refresh while a query is outstanding");

    deliver(&mut session, first.request_id, page(rows("A", 50), 120, Some("c1")));
    session.on_page_changed(1).unwrap();
    let second = only_sent(&transport);
    deliver(&mut session, second.request_id, page(rows("B", 50), 120, Some("c2")));

    session.on_refresh_tick().unwrap();
    let refresh = only_sent(&transport);
    assert_eq!(refresh.query.cursor, Some(Cursor::from("c1")));
    assert_eq!(session.state().page_index, 1);
}

#[test]
fn untokened_replies_need_legacy_correlation() {
    let untokened = |count| {
        let mut response = page(rows("L", 50), count, None);
        response.page_size = Some(50);
        ServerMessage { request_id: None, response }.encode().unwrap()
    };

    let (mut strict, _, _) = open_session();
    strict.handle_transport_event(TransportEvent::Text(untokened(7))).unwrap();
    assert!(strict.view().snapshot().is_loading);

    let options = SessionOptions {
        legacy_correlation: true,
        ..SessionOptions::default()
    };
    let (mut legacy, _, _) = connecting_session_with(options, MemoryPreferences::new());
    legacy.handle_transport_event(TransportEvent::Opened).unwrap();
    legacy.handle_transport_event(TransportEvent::Text(untokened(7))).unwrap();
    let view = legacy.view().snapshot();
    assert!(!view.is_loading);
    assert_eq!(view.total_count, 7);
}

#[test]
fn subscribers_see_each_published_view() {
    let (mut session, transport, _) = open_session();
    let mut rx = session.view().subscribe();

    let first = only_sent(&transport);
    deliver(&mut session, first.request_id, page(rows("A", 3), 3, None));

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().rows.len(), 3);
}
