//! Event command opcodes.
//!
//! Codes are shared by MV, MZ, VX and VX Ace; the few that differ only exist
//! in the newer engines.

pub const END: i32 = 0;

// Messages
pub const SHOW_TEXT: i32 = 101;
pub const TEXT_LINE: i32 = 401;
pub const SHOW_CHOICES: i32 = 102;
pub const WHEN_CHOICE: i32 = 402;
pub const WHEN_CANCEL: i32 = 403;
pub const CHOICES_END: i32 = 404;
pub const INPUT_NUMBER: i32 = 103;
pub const SELECT_ITEM: i32 = 104;
pub const SCROLL_TEXT: i32 = 105;
pub const SCROLL_LINE: i32 = 405;

// Flow
pub const COMMENT: i32 = 108;
pub const COMMENT_LINE: i32 = 408;
pub const CONDITIONAL: i32 = 111;
pub const ELSE: i32 = 411;
pub const CONDITIONAL_END: i32 = 412;
pub const LOOP: i32 = 112;
pub const REPEAT_ABOVE: i32 = 413;
pub const BREAK_LOOP: i32 = 113;
pub const EXIT_EVENT: i32 = 115;
pub const COMMON_EVENT: i32 = 117;
pub const LABEL: i32 = 118;
pub const JUMP_TO_LABEL: i32 = 119;

// Game state
pub const CONTROL_SWITCHES: i32 = 121;
pub const CONTROL_VARIABLES: i32 = 122;
pub const CONTROL_SELF_SWITCH: i32 = 123;
pub const CONTROL_TIMER: i32 = 124;
pub const CHANGE_GOLD: i32 = 125;
pub const CHANGE_ITEMS: i32 = 126;
pub const CHANGE_WEAPONS: i32 = 127;
pub const CHANGE_ARMORS: i32 = 128;
pub const CHANGE_PARTY: i32 = 129;

// Movement
pub const TRANSFER_PLAYER: i32 = 201;
pub const SET_VEHICLE_LOCATION: i32 = 202;
pub const SET_EVENT_LOCATION: i32 = 203;
pub const SCROLL_MAP: i32 = 204;
pub const SET_MOVE_ROUTE: i32 = 205;
pub const MOVE_ROUTE_STEP: i32 = 505;
pub const GET_ON_OFF_VEHICLE: i32 = 206;

// Battle, shop and name input
pub const BATTLE: i32 = 301;
pub const IF_WIN: i32 = 601;
pub const IF_ESCAPE: i32 = 602;
pub const IF_LOSE: i32 = 603;
pub const BATTLE_END: i32 = 604;
pub const SHOP: i32 = 302;
pub const SHOP_GOODS: i32 = 605;
pub const NAME_INPUT: i32 = 303;

// Actors
pub const CHANGE_STATE: i32 = 313;
pub const CHANGE_SKILL: i32 = 318;

// Enemies in battle
pub const ENEMY_HP: i32 = 331;
pub const ENEMY_STATE: i32 = 333;
pub const ENEMY_TRANSFORM: i32 = 336;
pub const FORCE_ACTION: i32 = 339;

// Advanced
pub const SCRIPT: i32 = 355;
pub const SCRIPT_LINE: i32 = 655;
pub const PLUGIN_COMMAND: i32 = 356;
pub const PLUGIN_COMMAND_MZ: i32 = 357;

/// Continuation opcode for an opcode that can span several raw commands.
pub fn continuation_of(code: i32) -> Option<i32> {
    match code {
        SHOW_TEXT => Some(TEXT_LINE),
        SCROLL_TEXT => Some(SCROLL_LINE),
        COMMENT => Some(COMMENT_LINE),
        SCRIPT => Some(SCRIPT_LINE),
        SHOP => Some(SHOP_GOODS),
        SET_MOVE_ROUTE => Some(MOVE_ROUTE_STEP),
        _ => None,
    }
}

/// Block closers and terminators that render nothing.
pub fn is_silent(code: i32) -> bool {
    matches!(code, END | CHOICES_END | CONDITIONAL_END | BATTLE_END)
}

/// Opcodes that mark a page as scripted story: dialogue, choices, scripts.
pub fn is_story(code: i32) -> bool {
    matches!(
        code,
        SHOW_TEXT
            | TEXT_LINE
            | SHOW_CHOICES
            | WHEN_CHOICE
            | WHEN_CANCEL
            | SCROLL_TEXT
            | SCROLL_LINE
            | SCRIPT
            | PLUGIN_COMMAND
    )
}
