//! Built-in GLSL 3.30 sources matching the fixed [`Vertex`](crate::Vertex) layout.

/// Transforms positions by `u_projection * u_transform` and forwards color and UV.
pub const DEFAULT_VERTEX_SOURCE: &str = r#"#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;
layout(location = 2) in vec2 a_texcoord;

uniform mat4 u_transform;
uniform mat4 u_projection;

out vec4 v_color;
out vec2 v_texcoord;

void main() {
    v_color = a_color;
    v_texcoord = a_texcoord;
    gl_Position = u_projection * u_transform * vec4(a_position, 1.0);
}
"#;

/// Modulates the vertex color by the texture bound to unit 0.
pub const DEFAULT_FRAGMENT_SOURCE: &str = r#"#version 330 core
in vec4 v_color;
in vec2 v_texcoord;

uniform sampler2D u_texture;
uniform bool u_use_texture;

out vec4 o_color;

void main() {
    vec4 texel = u_use_texture ? texture(u_texture, v_texcoord) : vec4(1.0);
    o_color = v_color * texel;
}
"#;
