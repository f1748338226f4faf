use std::sync::Arc;

use crate::alphabet::{Alphabet, Symbol};
use crate::context::*;
use crate::engine::HookAction;
use crate::error::Result;

fn alphabet() -> Result<Arc<Alphabet>> {
    Ok(Arc::new(Alphabet::from_pairs([
        ("CONNECT", b"CONNECT\n".to_vec()),
        ("DATA", b"DATA\n".to_vec()),
        ("OK", b"OK\n".to_vec()),
        ("ERROR", b"ERROR\n".to_vec()),
    ])?))
}

fn word(symbols: &[&str]) -> Arc<[Symbol]> {
    symbols.iter().copied().map(Symbol::from).collect()
}

fn consumed(symbols: &[&str]) -> Result<QueryContext> {
    let mut context = QueryContext::new(word(symbols), alphabet()?);
    for _ in symbols {
        assert!(matches!(context.on_receive(), HookAction::Supply(_)));
    }
    assert_eq!(context.on_receive(), HookAction::Stall);
    assert_eq!(context.phase(), Phase::ConsumeComplete);
    Ok(context)
}

#[test]
fn supplies_word_in_order() -> Result<()> {
    let mut context = QueryContext::new(word(&["CONNECT", "DATA"]), alphabet()?);
    assert_eq!(context.phase(), Phase::Consuming);

    assert_eq!(
        context.on_receive(),
        HookAction::Supply(b"CONNECT\n".to_vec())
    );
    assert_eq!(context.position(), 1);
    assert_eq!(context.on_receive(), HookAction::Supply(b"DATA\n".to_vec()));
    assert_eq!(context.position(), 2);

    // Still consuming until the target comes back for more
    assert_eq!(context.phase(), Phase::Consuming);
    assert!(!context.is_done_consuming());

    assert_eq!(context.on_receive(), HookAction::Stall);
    assert_eq!(context.phase(), Phase::ConsumeComplete);
    assert!(context.is_done_consuming());
    Ok(())
}

#[test]
fn output_while_consuming_is_ignored() -> Result<()> {
    let mut context = QueryContext::new(word(&["CONNECT", "DATA"]), alphabet()?);
    assert!(matches!(context.on_receive(), HookAction::Supply(_)));
    assert_eq!(context.on_send(b"OK\n"), HookAction::Continue);
    assert_eq!(context.phase(), Phase::Consuming);
    assert_eq!(context.probed_symbol(), None);
    assert_eq!(context.position(), 1);
    Ok(())
}

#[test]
fn output_after_word_completes_consumption() -> Result<()> {
    let mut context = QueryContext::new(word(&["CONNECT"]), alphabet()?);
    assert!(matches!(context.on_receive(), HookAction::Supply(_)));

    // Parked at the write so probing can observe it
    assert_eq!(context.on_send(b"OK\n"), HookAction::Stall);
    assert_eq!(context.phase(), Phase::ConsumeComplete);
    Ok(())
}

#[test]
fn empty_word_completes_on_first_hook() -> Result<()> {
    let mut context = QueryContext::new(word(&[]), alphabet()?);
    assert_eq!(context.on_send(b"OK\n"), HookAction::Stall);
    assert!(context.is_done_consuming());
    Ok(())
}

#[test]
fn parked_until_probing_begins() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    assert_eq!(context.on_send(b"OK\n"), HookAction::Stall);
    assert_eq!(context.on_receive(), HookAction::Stall);
    assert_eq!(context.phase(), Phase::ConsumeComplete);

    assert!(context.begin_probing());
    assert_eq!(context.phase(), Phase::Probing);
    assert!(!context.begin_probing(), "probing begins only once");
    Ok(())
}

#[test]
fn begin_probing_requires_consumed_word() -> Result<()> {
    let mut context = QueryContext::new(word(&["CONNECT"]), alphabet()?);
    assert!(!context.begin_probing());
    assert_eq!(context.phase(), Phase::Consuming);
    Ok(())
}

#[test]
fn probe_captures_symbol() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_send(b"OK\n"), HookAction::Continue);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("OK")));

    // Terminal
    assert_eq!(context.on_send(b"ERROR\n"), HookAction::Stall);
    assert_eq!(context.on_receive(), HookAction::Stall);
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("OK")));
    Ok(())
}

#[test]
fn probe_accumulates_split_output() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_send(b"ERR"), HookAction::Continue);
    assert!(!context.done_probing());
    assert_eq!(context.pending_output(), b"ERR");

    assert_eq!(context.on_send(b"OR\n"), HookAction::Continue);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("ERROR")));
    assert!(context.pending_output().is_empty());
    Ok(())
}

#[test]
fn output_past_symbol_keeps_leading_symbol() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_send(b"OK\nDATA\n"), HookAction::Continue);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("OK")));

    // Same bytes split across writes
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_send(b"OK"), HookAction::Continue);
    assert!(!context.done_probing());
    assert_eq!(context.on_send(b"\nDATA\n"), HookAction::Continue);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("OK")));
    assert!(context.pending_output().is_empty());
    Ok(())
}

#[test]
fn unrecognised_output_completes_without_symbol() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_send(b"421 BYE\n"), HookAction::Continue);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), None);
    Ok(())
}

#[test]
fn receive_while_probing_completes_without_symbol() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();

    assert_eq!(context.on_receive(), HookAction::Stall);
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), None);
    Ok(())
}

#[test]
fn deadend_while_probing_is_pending() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();
    context.on_send(b"ERR");
    context.mark_deadended();

    assert!(context.probing_pending());
    assert!(!context.done_probing());

    context.collect_pending_probe();
    assert!(!context.probing_pending());
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("ERROR")));

    // Idempotent
    context.collect_pending_probe();
    assert_eq!(context.probed_symbol(), Some(&Symbol::from("ERROR")));
    Ok(())
}

#[test]
fn pending_probe_without_output_yields_nothing() -> Result<()> {
    let mut context = consumed(&["CONNECT"])?;
    context.begin_probing();
    context.mark_deadended();
    assert!(context.probing_pending());

    context.collect_pending_probe();
    assert!(context.done_probing());
    assert_eq!(context.probed_symbol(), None);
    Ok(())
}

#[test]
fn deadend_outside_probing_is_not_pending() -> Result<()> {
    let mut consuming = QueryContext::new(word(&["CONNECT"]), alphabet()?);
    consuming.mark_deadended();
    assert!(!consuming.probing_pending());

    let mut parked = consumed(&["CONNECT"])?;
    parked.mark_deadended();
    assert!(!parked.probing_pending());
    parked.collect_pending_probe();
    assert_eq!(parked.phase(), Phase::ConsumeComplete);
    Ok(())
}

#[test]
fn forked_contexts_diverge() -> Result<()> {
    let mut parent = consumed(&["CONNECT"])?;
    parent.begin_probing();
    let mut child = parent.clone();

    parent.on_send(b"OK\n");
    child.on_send(b"ERROR\n");

    assert_eq!(parent.probed_symbol(), Some(&Symbol::from("OK")));
    assert_eq!(child.probed_symbol(), Some(&Symbol::from("ERROR")));
    Ok(())
}

#[test]
fn path_context_variants() -> Result<()> {
    let membership = PathContext::membership(word(&["CONNECT"]), alphabet()?);
    let probe = PathContext::probe(word(&["CONNECT"]), alphabet()?);
    assert_eq!(membership.kind(), QueryKind::Membership);
    assert_eq!(probe.kind(), QueryKind::Probe);

    let PathContext::Membership(mut membership) = membership else {
        panic!("expected membership context");
    };
    assert!(!membership.is_done_membership());
    membership.context_mut().on_receive();
    membership.context_mut().on_receive();
    assert!(membership.is_done_membership());

    let PathContext::Probe(mut probe) = probe else {
        panic!("expected probe context");
    };
    assert!(!probe.is_done_prefix());
    probe.context_mut().on_receive();
    probe.context_mut().on_receive();
    assert!(probe.is_done_prefix());
    Ok(())
}
