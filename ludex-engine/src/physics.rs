use glam::Vec2;
use ludex_core::BallState;

/// Projectile position after `t` seconds of flight.
///
/// Motion is integrated in scale-independent units and converted to
/// pixels at the end, so the same trial plays identically at any canvas
/// size. Position is a function of elapsed time only; there is no
/// frame-count dependency.
pub fn integrate(launch: Vec2, velocity: Vec2, gravity: f32, t: f32, scale: f32) -> Vec2 {
    let unit = launch + velocity * t + Vec2::new(0.0, 0.5 * gravity * t * t);
    unit * scale
}

/// A moving 2D point-mass, owned exclusively by the active trial.
#[derive(Debug, Clone)]
pub struct Ball {
    /// Flight anchor in scale units. Re-anchored on every bounce.
    pub launch: Vec2,
    /// Current position in pixels.
    pub pos: Vec2,
    /// Velocity at the anchor, in scale units per second.
    pub velocity: Vec2,
    /// Radius in pixels.
    pub radius: f32,
    pub restitution: f32,
    pub state: BallState,
}

impl Ball {
    pub fn new(launch: Vec2, velocity: Vec2, radius: f32, restitution: f32, scale: f32) -> Self {
        Self {
            launch,
            pos: launch * scale,
            velocity,
            radius,
            restitution,
            state: BallState::Start,
        }
    }

    /// Advance along the trajectory, `t` seconds after the current anchor.
    pub fn advance(&mut self, gravity: f32, t: f32, scale: f32) {
        self.pos = integrate(self.launch, self.velocity, gravity, t, scale);
    }

    /// Position in scale-independent units, for export rows.
    pub fn unit_pos(&self, scale: f32) -> Vec2 {
        self.pos / scale
    }
}

/// Has the ball left the playable canvas bounds entirely.
pub fn wall_collision(ball: &Ball, canvas_w: f32, canvas_h: f32) -> bool {
    ball.pos.x + ball.radius < 0.0
        || ball.pos.x - ball.radius > canvas_w
        || ball.pos.y + ball.radius < 0.0
        || ball.pos.y - ball.radius > canvas_h
}

/// Participant-controlled paddle, position and dimensions in pixels.
#[derive(Debug, Clone)]
pub struct Paddle {
    pub pos: Vec2,
    pub dims: Vec2,
}

impl Paddle {
    /// Track the pointer's vertical position, clamped to the canvas.
    pub fn track(&mut self, pointer_y: f32, canvas_h: f32) {
        self.pos.y = pointer_y.clamp(0.0, canvas_h - self.dims.y);
    }

    pub fn overlaps(&self, ball: &Ball) -> bool {
        ball.pos.y >= self.pos.y - self.dims.y
            && ball.pos.y < self.pos.y + self.dims.y
            && ball.pos.x > self.pos.x - self.dims.x
            && ball.pos.x < self.pos.x + self.dims.x
    }
}

/// Check and resolve an inelastic paddle bounce at flight time `t`.
///
/// On contact the instantaneous velocity (anchor velocity plus the fall
/// speed accumulated over `t`) is scaled by the restitution coefficient,
/// with the vertical component biased by `lift`, the ball is snapped to
/// the paddle surface and the trajectory re-anchored there. Returns
/// whether contact happened.
pub fn paddle_bounce(
    ball: &mut Ball,
    paddle: &Paddle,
    gravity: f32,
    t: f32,
    lift: f32,
    scale: f32,
) -> bool {
    if !paddle.overlaps(ball) {
        return false;
    }
    ball.velocity.y = (ball.velocity.y + gravity * t) * ball.restitution * lift;
    ball.velocity.x *= -ball.restitution;
    ball.pos.y = paddle.pos.y - ball.radius;
    ball.launch = ball.pos / scale;
    true
}
