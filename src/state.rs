//! Game state and the ordering of the per-frame system sets.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;
use bevy::window::WindowFocused;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    /// Waiting for the level project or building the requested room.
    #[default]
    Loading,
    Playing,
    Paused,
}

/// Input is sampled, the room advances, then everything that reads the settled room runs.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Movement,
    Effects,
}

/// `Escape` or `P` flips between playing and paused. Rooms are not updated while paused.
pub fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keyboard.any_just_pressed([KeyCode::Escape, KeyCode::KeyP]) {
        return;
    }

    match state.get() {
        GameState::Playing => {
            info!("paused");
            next_state.set(GameState::Paused);
        }
        GameState::Paused => {
            info!("resumed");
            next_state.set(GameState::Playing);
        }
        GameState::Loading => {}
    }
}

/// Losing window focus pauses a running game. Regaining it leaves the game paused.
pub fn pause_on_focus_loss(
    mut focus_events: EventReader<WindowFocused>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Some(event) = focus_events.read().last() else {
        return;
    };
    if !event.focused && *state.get() == GameState::Playing {
        info!("window lost focus, paused");
        next_state.set(GameState::Paused);
    }
}

#[cfg(test)]
mod tests {
    use bevy::state::app::StatesPlugin;

    use super::*;

    fn app_in(state: GameState) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .add_event::<WindowFocused>()
            .init_state::<GameState>()
            .add_systems(Update, pause_on_focus_loss);
        app.world_mut()
            .resource_mut::<NextState<GameState>>()
            .set(state);
        app.update();
        app
    }

    fn send_focus(app: &mut App, focused: bool) {
        app.world_mut().send_event(WindowFocused {
            window: Entity::PLACEHOLDER,
            focused,
        });
        app.update();
        app.update();
    }

    fn current(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    #[test]
    fn focus_loss_pauses_play() {
        let mut app = app_in(GameState::Playing);
        assert_eq!(current(&app), GameState::Playing);

        send_focus(&mut app, false);
        assert_eq!(current(&app), GameState::Paused);

        send_focus(&mut app, true);
        assert_eq!(current(&app), GameState::Paused);
    }

    #[test]
    fn focus_loss_while_loading_is_ignored() {
        let mut app = app_in(GameState::Loading);
        send_focus(&mut app, false);
        assert_eq!(current(&app), GameState::Loading);
    }
}
