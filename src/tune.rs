/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Half-width of the aspiration window around the previous iteration's score.
macro_rules! aspiration_window_delta {
    () => {
        40
    };
}
pub(crate) use aspiration_window_delta;

/// Minimum depth at which to use aspiration windows at all.
macro_rules! min_aspiration_window_depth {
    () => {
        5
    };
}
pub(crate) use min_aspiration_window_depth;

/// Margin added to the static evaluation when futility-pruning quiet moves at depth 1.
macro_rules! futility_margin {
    () => {
        200
    };
}
pub(crate) use futility_margin;

/// History score above which a quiet move is exempt from late move reductions.
macro_rules! history_good_threshold {
    () => {
        1_000
    };
}
pub(crate) use history_good_threshold;

/// Divisor in the late-move-reduction formula.
macro_rules! lmr_divisor {
    () => {
        3.14
    };
}
pub(crate) use lmr_divisor;

/// Largest reduction the LMR table may hold.
macro_rules! max_lmr_reduction {
    () => {
        4
    };
}
pub(crate) use max_lmr_reduction;

/// Number of moves assumed to remain when the `movestogo` field is absent.
macro_rules! movestogo_default {
    () => {
        30
    };
}
pub(crate) use movestogo_default;

/// Lower clamp on any computed time budget, in milliseconds.
macro_rules! min_search_millis {
    () => {
        10
    };
}
pub(crate) use min_search_millis;
