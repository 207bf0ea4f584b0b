use static_assertions::const_assert;

/// Full-scale reading of the 10-bit sampler.
pub const ADC_FULL_SCALE: u16 = 1023;
/// Sensor supply rail.
pub const ADC_REFERENCE_V: f32 = 5.0;

const ENGINE_SPAN_C: f32 = 120.0;
const AMBIENT_SPAN_C: f32 = 70.0;
const AMBIENT_OFFSET_C: f32 = -20.0;

/// Duty percentages selectable in AUTO mode; also the only values the
/// manual override accepts.
pub const DUTY_STEPS: [u8; 5] = [0, 25, 50, 75, 100];

/// Lower band edges, inclusive, pairing with `DUTY_STEPS[1..]`.
const DUTY_BAND_EDGES_C: [f32; 4] = [60.0, 70.0, 80.0, 90.0];

const_assert!(DUTY_STEPS.len() == DUTY_BAND_EDGES_C.len() + 1);

/// Clamp arbitrary sample arithmetic into the representable 10-bit range.
/// Scenario interpolation and slider input are not trusted to stay in range.
pub fn clamp_sample(raw: i32) -> u16 {
    raw.clamp(0, ADC_FULL_SCALE as i32) as u16
}

pub fn sample_to_voltage(raw: u16) -> f32 {
    let raw = raw.min(ADC_FULL_SCALE);
    f32::from(raw) / f32::from(ADC_FULL_SCALE) * ADC_REFERENCE_V
}

/// Engine coolant channel: 0..=1023 maps linearly onto 0..=120 degC.
pub fn sample_to_engine_temp(raw: u16) -> f32 {
    let raw = raw.min(ADC_FULL_SCALE);
    f32::from(raw) / f32::from(ADC_FULL_SCALE) * ENGINE_SPAN_C
}

/// Ambient channel: 0..=1023 maps linearly onto -20..=50 degC.
pub fn sample_to_ambient_temp(raw: u16) -> f32 {
    let raw = raw.min(ADC_FULL_SCALE);
    f32::from(raw) / f32::from(ADC_FULL_SCALE) * AMBIENT_SPAN_C + AMBIENT_OFFSET_C
}

/// Inverse of [`sample_to_engine_temp`], rounded to the nearest sample.
/// Used to turn scripted target temperatures into ramp endpoints.
pub fn engine_temp_to_sample(temp_c: f32) -> u16 {
    clamp_sample((temp_c / ENGINE_SPAN_C * f32::from(ADC_FULL_SCALE)).round() as i32)
}

/// Inverse of [`sample_to_ambient_temp`], rounded to the nearest sample.
pub fn ambient_temp_to_sample(temp_c: f32) -> u16 {
    clamp_sample(
        ((temp_c - AMBIENT_OFFSET_C) / AMBIENT_SPAN_C * f32::from(ADC_FULL_SCALE)).round() as i32,
    )
}

/// Step function from engine temperature to fan duty.
///
/// Band lower bounds are inclusive: exactly 60 degC already selects 25 %.
pub fn duty_for_temperature(temp_c: f32) -> u8 {
    let mut duty = DUTY_STEPS[0];
    for (edge, step) in DUTY_BAND_EDGES_C.iter().zip(&DUTY_STEPS[1..]) {
        if temp_c >= *edge {
            duty = *step;
        }
    }
    duty
}
