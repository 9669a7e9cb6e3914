//! WGSL sources. The scattering model is shared by the sky pass and the
//! environment bake so reflections match the visible sky.

macro_rules! scattering_wgsl {
    () => {
        r#"
const PI: f32 = 3.141592653589793;
const UP: vec3<f32> = vec3<f32>(0.0, 1.0, 0.0);
const SUN_E: f32 = 1000.0;
const CUTOFF_ANGLE: f32 = 1.6110731556870734;
const STEEPNESS: f32 = 1.5;
const TOTAL_RAYLEIGH: vec3<f32> = vec3<f32>(5.804542996261093e-6, 1.3562911419845635e-5, 3.0265902468824876e-5);
const MIE_CONST: vec3<f32> = vec3<f32>(1.8399918514433978e14, 2.7798023919660528e14, 4.0790479543861094e14);
const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.9999566769464484;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;
const EXPOSURE: f32 = 0.8333333;

fn sun_intensity(zenith_cos: f32) -> f32 {
    let angle = acos(clamp(zenith_cos, -1.0, 1.0));
    return SUN_E * max(0.0, 1.0 - exp(-((CUTOFF_ANGLE - angle) / STEEPNESS)));
}

fn total_mie(turbidity: f32) -> vec3<f32> {
    let c = (0.2 * turbidity) * 10e-18;
    return 0.434 * c * MIE_CONST;
}

// coefficients: turbidity, rayleigh, mie coefficient, mie directional g
fn sky_radiance(direction: vec3<f32>, coefficients: vec4<f32>, sun_position: vec3<f32>, sun_disk_weight: f32) -> vec3<f32> {
    let sun_direction = normalize(sun_position);
    let sun_e = sun_intensity(dot(sun_direction, UP));
    let sun_fade = 1.0 - clamp(1.0 - exp(sun_position.y / 450000.0), 0.0, 1.0);
    let beta_r = TOTAL_RAYLEIGH * (coefficients.y - (1.0 - sun_fade));
    let beta_m = total_mie(coefficients.x) * coefficients.z;

    let zenith_angle = acos(max(0.0, dot(UP, direction)));
    let inverse = 1.0 / (cos(zenith_angle) + 0.15 * pow(93.885 - (zenith_angle * 180.0 / PI), -1.253));
    let fex = exp(-(beta_r * (RAYLEIGH_ZENITH_LENGTH * inverse) + beta_m * (MIE_ZENITH_LENGTH * inverse)));

    let cos_theta = dot(direction, sun_direction);
    let r_phase = THREE_OVER_SIXTEEN_PI * (1.0 + pow(cos_theta * 0.5 + 0.5, 2.0));
    let g = coefficients.w;
    let g2 = g * g;
    let m_phase = ONE_OVER_FOUR_PI * ((1.0 - g2) / pow(1.0 - 2.0 * g * cos_theta + g2, 1.5));
    let ratio = (beta_r * r_phase + beta_m * m_phase) / (beta_r + beta_m);

    var lin = pow(sun_e * ratio * (1.0 - fex), vec3<f32>(1.5));
    let horizon = clamp(pow(1.0 - dot(UP, sun_direction), 5.0), 0.0, 1.0);
    lin *= mix(vec3<f32>(1.0), pow(sun_e * ratio * fex, vec3<f32>(0.5)), horizon);

    var l0 = vec3<f32>(0.1) * fex;
    let disk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 += sun_e * 19000.0 * fex * disk * sun_disk_weight;

    let color = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    return pow(color, vec3<f32>(1.0 / (1.2 + 1.2 * sun_fade)));
}

fn tone_map(color: vec3<f32>) -> vec3<f32> {
    let x = color * EXPOSURE;
    return clamp((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14), vec3<f32>(0.0), vec3<f32>(1.0));
}
"#
    };
}

macro_rules! frame_wgsl {
    () => {
        r#"
struct FrameUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    sun: vec4<f32>,
    sun_direction: vec4<f32>,
    scattering: vec4<f32>,
    // distortion scale, size, time, alpha
    water: vec4<f32>,
    sun_color: vec4<f32>,
    water_color: vec4<f32>,
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniform;
"#
    };
}

macro_rules! textures_wgsl {
    () => {
        r#"
@group(1) @binding(0)
var normal_map: texture_2d<f32>;
@group(1) @binding(1)
var normal_sampler: sampler;
@group(1) @binding(2)
var radiance_map: texture_cube<f32>;
@group(1) @binding(3)
var irradiance_map: texture_cube<f32>;
@group(1) @binding(4)
var cube_sampler: sampler;
"#
    };
}

pub(super) const SKY_SHADER: &str = concat!(
    scattering_wgsl!(),
    frame_wgsl!(),
    r#"
struct SkyOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> SkyOutput {
    var out: SkyOutput;
    out.position = frame.view_proj * vec4<f32>(position, 1.0);
    out.world_pos = position;
    return out;
}

@fragment
fn fs_main(input: SkyOutput) -> @location(0) vec4<f32> {
    let direction = normalize(input.world_pos - frame.camera_position.xyz);
    let color = sky_radiance(direction, frame.scattering, frame.sun.xyz, 1.0);
    return vec4<f32>(tone_map(color), 1.0);
}
"#
);

pub(super) const WATER_SHADER: &str = concat!(
    scattering_wgsl!(),
    frame_wgsl!(),
    textures_wgsl!(),
    r#"
struct WaterOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> WaterOutput {
    var out: WaterOutput;
    out.position = frame.view_proj * vec4<f32>(position, 1.0);
    out.world_pos = position;
    return out;
}

fn noise(uv: vec2<f32>, time: f32) -> vec4<f32> {
    let uv0 = uv / 103.0 + vec2<f32>(time / 17.0, time / 29.0);
    let uv1 = uv / 107.0 - vec2<f32>(time / -19.0, time / 31.0);
    let uv2 = uv / vec2<f32>(8907.0, 9803.0) + vec2<f32>(time / 101.0, time / 97.0);
    let uv3 = uv / vec2<f32>(1091.0, 1027.0) - vec2<f32>(time / 109.0, time / -113.0);
    let sum = textureSample(normal_map, normal_sampler, uv0)
        + textureSample(normal_map, normal_sampler, uv1)
        + textureSample(normal_map, normal_sampler, uv2)
        + textureSample(normal_map, normal_sampler, uv3);
    return sum * 0.5 - 1.0;
}

@fragment
fn fs_main(input: WaterOutput) -> @location(0) vec4<f32> {
    let distortion_scale = frame.water.x;
    let size = frame.water.y;
    let time = frame.water.z;
    let alpha = frame.water.w;
    let sun_direction = frame.sun_direction.xyz;
    let sun_color = frame.sun_color.rgb;

    let ripples = noise(input.world_pos.xz * size, time);
    let surface_normal = normalize(ripples.xzy * vec3<f32>(1.5, 1.0, 1.5));

    let world_to_eye = frame.camera_position.xyz - input.world_pos;
    let eye_direction = normalize(world_to_eye);
    let sun_reflection = normalize(reflect(-sun_direction, surface_normal));
    let specular = pow(max(0.0, dot(eye_direction, sun_reflection)), 100.0) * sun_color * 2.0;
    let diffuse = max(dot(sun_direction, surface_normal), 0.0) * sun_color * 0.5;

    let distortion = surface_normal.xz * (0.001 + 1.0 / length(world_to_eye)) * distortion_scale;
    let mirrored = reflect(-eye_direction, UP);
    let lookup = normalize(vec3<f32>(mirrored.x + distortion.x, max(mirrored.y, 0.001), mirrored.z + distortion.y));
    let reflection = textureSample(radiance_map, cube_sampler, lookup).rgb;

    let theta = max(dot(eye_direction, surface_normal), 0.0);
    let reflectance = 0.3 + 0.7 * pow(1.0 - theta, 5.0);
    let scatter = max(0.0, dot(surface_normal, eye_direction)) * frame.water_color.rgb;
    let albedo = mix(
        sun_color * diffuse * 0.3 + scatter,
        vec3<f32>(0.1) + reflection * 0.9 + reflection * specular,
        reflectance,
    );
    return vec4<f32>(tone_map(albedo), alpha);
}
"#
);

pub(super) const MODEL_SHADER: &str = concat!(
    scattering_wgsl!(),
    frame_wgsl!(),
    textures_wgsl!(),
    r#"
struct ModelOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> ModelOutput {
    var out: ModelOutput;
    let world = frame.model * vec4<f32>(position, 1.0);
    out.position = frame.view_proj * world;
    let normal_matrix = mat3x3<f32>(frame.normal[0].xyz, frame.normal[1].xyz, frame.normal[2].xyz);
    out.normal = normal_matrix * normal;
    return out;
}

@fragment
fn fs_main(input: ModelOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let ambient = textureSample(irradiance_map, cube_sampler, normal).rgb;
    let diffuse = max(dot(normal, frame.sun_direction.xyz), 0.0) * frame.sun_color.rgb;
    let base = vec3<f32>(0.8);
    return vec4<f32>(tone_map(base * (ambient + diffuse * 0.8)), 1.0);
}
"#
);

pub(super) const BAKE_SHADER: &str = concat!(
    scattering_wgsl!(),
    r#"
struct BakeUniform {
    // face index, irradiance flag, face size, unused
    face: vec4<f32>,
    coefficients: vec4<f32>,
    sun: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> bake: BakeUniform;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}

fn face_direction(face: i32, u: f32, v: f32) -> vec3<f32> {
    var direction = vec3<f32>(-u, -v, -1.0);
    switch face {
        case 0: { direction = vec3<f32>(1.0, -v, -u); }
        case 1: { direction = vec3<f32>(-1.0, -v, u); }
        case 2: { direction = vec3<f32>(u, 1.0, v); }
        case 3: { direction = vec3<f32>(u, -1.0, -v); }
        case 4: { direction = vec3<f32>(u, -v, 1.0); }
        default: {}
    }
    return normalize(direction);
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let size = bake.face.z;
    let n = face_direction(i32(bake.face.x), position.x / size * 2.0 - 1.0, position.y / size * 2.0 - 1.0);
    if (bake.face.y < 0.5) {
        return vec4<f32>(sky_radiance(n, bake.coefficients, bake.sun.xyz, 1.0), 1.0);
    }

    // Cosine-weighted stratified samples over the hemisphere around n.
    let helper = select(vec3<f32>(1.0, 0.0, 0.0), vec3<f32>(0.0, 1.0, 0.0), abs(n.y) < 0.999);
    let tangent = normalize(cross(helper, n));
    let bitangent = cross(n, tangent);
    var sum = vec3<f32>(0.0);
    for (var i = 0u; i < 8u; i++) {
        for (var j = 0u; j < 8u; j++) {
            let r1 = (f32(i) + 0.5) / 8.0;
            let r2 = (f32(j) + 0.5) / 8.0;
            let phi = 2.0 * PI * r2;
            let sin_theta = sqrt(r1);
            let dir = tangent * (cos(phi) * sin_theta) + bitangent * (sin(phi) * sin_theta) + n * sqrt(1.0 - r1);
            sum += sky_radiance(normalize(dir), bake.coefficients, bake.sun.xyz, 0.0);
        }
    }
    return vec4<f32>(sum / 64.0, 1.0);
}
"#
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_has_both_entry_points() {
        for source in [SKY_SHADER, WATER_SHADER, MODEL_SHADER, BAKE_SHADER] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }

    #[test]
    fn scene_shaders_share_the_frame_layout() {
        for source in [SKY_SHADER, WATER_SHADER, MODEL_SHADER] {
            assert!(source.contains("struct FrameUniform"));
        }
        assert!(!BAKE_SHADER.contains("struct FrameUniform"));
    }

    #[test]
    fn lit_surfaces_use_the_water_sun_direction() {
        for source in [WATER_SHADER, MODEL_SHADER] {
            assert!(source.contains("frame.sun_direction.xyz"));
            assert!(!source.contains("normalize(frame.sun.xyz)"));
        }
    }
}
