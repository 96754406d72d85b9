use super::*;

// =============================================================
// Open/close toggle transitions
// =============================================================

#[test]
fn first_open_starts_the_connection() {
    assert_eq!(next_toggle(false, false), ToggleEffect::Open { first_open: true });
}

#[test]
fn toggle_sequence_alternates_open_and_close() {
    // Closed → open (handshake) → close → reopen without a new handshake.
    assert_eq!(next_toggle(false, false), ToggleEffect::Open { first_open: true });
    assert_eq!(next_toggle(true, true), ToggleEffect::Close);
    assert_eq!(next_toggle(false, true), ToggleEffect::Open { first_open: false });
    assert_eq!(next_toggle(true, true), ToggleEffect::Close);
}

#[test]
fn toggling_while_open_always_closes() {
    assert_eq!(next_toggle(true, false), ToggleEffect::Close);
    assert_eq!(next_toggle(true, true), ToggleEffect::Close);
}
