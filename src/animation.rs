// Animation Module - Per-frame LED color rules along the spiral
use anyhow::Result;

use crate::types::Rgb;

/// Counter period of the coil chase
pub const CHASE_PERIOD: u32 = 512;
/// Evenly phased bright spots per coil segment
pub const CHASE_MARKERS: u32 = 8;

pub const CHASE_ON: Rgb = Rgb::new(255, 255, 0);
pub const CHASE_OFF: Rgb = Rgb::new(32, 32, 32);

/// Distance between water drops, in LEDs
pub const WATER_SPACING: usize = 18;
/// Ticks per one-LED advance of the water fill
pub const WATER_SPEED: u64 = 3;
/// LEDs driven by the water fill
pub const WATER_NUM_LEDS: usize = 400;

pub const WATER_HEAD: Rgb = Rgb::new(0, 0, 255);
pub const WATER_TRAIL: Rgb = Rgb::new(0, 0, 150);
pub const WATER_TAIL: Rgb = Rgb::new(120, 0, 120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedAnimation {
    CoilChase,
    WaterFill,
}

impl LedAnimation {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "coil_chase" | "coilchase" | "chase" => Some(LedAnimation::CoilChase),
            "water_fill" | "waterfill" | "water" => Some(LedAnimation::WaterFill),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedAnimation::CoilChase => "coil_chase",
            LedAnimation::WaterFill => "water_fill",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            LedAnimation::CoilChase => LedAnimation::WaterFill,
            LedAnimation::WaterFill => LedAnimation::CoilChase,
        }
    }
}

/// Fixed-length strip of RGB values, mutated in place every tick
#[derive(Debug, Clone, PartialEq)]
pub struct LedBuffer {
    leds: Vec<Rgb>,
}

impl LedBuffer {
    pub fn new(len: usize) -> Self {
        LedBuffer {
            leds: vec![Rgb::BLACK; len],
        }
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.leds.get(index).copied()
    }

    pub fn set(&mut self, index: usize, color: Rgb) {
        if let Some(led) = self.leds.get_mut(index) {
            *led = color;
        }
    }

    pub fn lit_count(&self) -> usize {
        self.leds.iter().filter(|c| !c.is_black()).count()
    }
}

/// Animation counters; each rule only advances its own field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationState {
    pub counter: u32,
    pub cycle: u64,
}

/// Check that coil boundaries are strictly increasing and inside the buffer
pub fn validate_coils(coils: &[usize], led_count: usize) -> Result<()> {
    if coils.windows(2).any(|w| w[0] >= w[1]) {
        anyhow::bail!("Coil boundaries must be strictly increasing: {:?}", coils);
    }
    if let Some(&last) = coils.last() {
        if last >= led_count {
            anyhow::bail!("Coil boundary {} is outside the {} LED buffer", last, led_count);
        }
    }
    Ok(())
}

/// Rule A: eight bright spots travel through each coil segment.
///
/// Each segment `[coils[i], coils[i+1])` rescales the shared counter to its own
/// length, so longer coils show slower-looking motion. LEDs past the last
/// boundary are not touched.
pub fn coil_chase_tick(state: AnimationState, leds: &mut LedBuffer, coils: &[usize]) -> AnimationState {
    let counter = (state.counter + 1) % CHASE_PERIOD;

    for segment in coils.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let t = end.saturating_sub(start);

        let mut markers = [0usize; CHASE_MARKERS as usize];
        for (k, marker) in markers.iter_mut().enumerate() {
            let phase = (counter as usize + 64 * k) % CHASE_PERIOD as usize;
            *marker = t * phase / CHASE_PERIOD as usize + start;
        }

        for j in start..end {
            let color = if markers.contains(&j) { CHASE_ON } else { CHASE_OFF };
            leds.set(j, color);
        }
    }

    AnimationState { counter, ..state }
}

/// Rule B: blue drops with a fading trail march along the first
/// `num_leds` LEDs, one LED every `WATER_SPEED` ticks.
///
/// The trail comparisons add 1 and 2 to the index phase without wrapping, so
/// the trail never appears on the wrap from the last slot to the first.
pub fn water_fill_tick(state: AnimationState, leds: &mut LedBuffer, num_leds: usize) -> AnimationState {
    let phase = (state.cycle / WATER_SPEED) as usize % WATER_SPACING;

    for i in 0..num_leds.min(leds.len()) {
        let slot = i % WATER_SPACING;
        let color = if slot == phase {
            WATER_HEAD
        } else if slot + 1 == phase {
            WATER_TRAIL
        } else if slot + 2 == phase {
            WATER_TAIL
        } else {
            Rgb::BLACK
        };
        leds.set(i, color);
    }

    AnimationState {
        cycle: state.cycle.wrapping_add(1),
        ..state
    }
}

/// Owns the animation state and the layout it needs; one `tick` per frame
#[derive(Debug, Clone)]
pub struct Animator {
    pub mode: LedAnimation,
    pub state: AnimationState,
    coils: Vec<usize>,
    water_leds: usize,
}

impl Animator {
    pub fn new(mode: LedAnimation, coils: Vec<usize>, water_leds: usize) -> Self {
        Animator {
            mode,
            state: AnimationState::default(),
            coils,
            water_leds,
        }
    }

    pub fn coils(&self) -> &[usize] {
        &self.coils
    }

    pub fn set_mode(&mut self, mode: LedAnimation) {
        self.mode = mode;
    }

    pub fn tick(&mut self, leds: &mut LedBuffer) {
        self.state = match self.mode {
            LedAnimation::CoilChase => coil_chase_tick(self.state, leds, &self.coils),
            LedAnimation::WaterFill => water_fill_tick(self.state, leds, self.water_leds),
        };
    }
}
