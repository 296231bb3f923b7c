/// Crouching follows the button on the ground. Standing up is refused while the standing hitbox
/// would overlap a tile, whatever the input says.
pub fn update_crouch(held: bool, on_ground: bool, crouching: bool, headroom_blocked: bool) -> bool {
    (held && on_ground) || (crouching && headroom_blocked)
}
