//! Fixed timestep simulation tick
//!
//! Platforms move first, then the field perk, then the player.

use super::command::CommandTable;
use super::state::Game;

/// Advance the game by one logic frame
pub fn update_game(game: &mut Game, commands: &mut CommandTable) {
    if game.message.end_frame < game.current_frame && !game.message.is_empty() {
        game.message.clear();
    }
    game.update_platforms();
    game.update_perk();
    game.update_player(commands);
    game.current_frame += 1;
}
