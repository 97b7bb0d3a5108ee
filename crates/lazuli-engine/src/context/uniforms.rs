//! Named uniform setters.
//!
//! Every setter binds its shader first. Names the program does not expose
//! are ignored.

use crate::coords::Mat4;
use crate::device::{Device, UniformValue};
use crate::shader::Shader;

use super::Context;

impl<D: Device> Context<D> {
    /// Writes `value` to the uniform called `name`.
    pub fn set_uniform(&mut self, shader: &Shader<D>, name: &str, value: UniformValue<'_>) {
        self.bind_program(shader);
        if let Some(uniform) = shader.uniforms.find(name) {
            self.device.set_uniform(uniform.location(), value);
        }
    }

    fn set_ints(&mut self, shader: &Shader<D>, name: &str, components: u8, data: &[i32]) {
        self.set_uniform(shader, name, UniformValue::Ints { components, data });
    }

    fn set_floats(&mut self, shader: &Shader<D>, name: &str, components: u8, data: &[f32]) {
        self.set_uniform(shader, name, UniformValue::Floats { components, data });
    }

    fn set_matrices(&mut self, shader: &Shader<D>, name: &str, dim: u8, data: &[f32]) {
        let transpose = self.config.transpose_matrices;
        self.set_uniform(
            shader,
            name,
            UniformValue::Matrices {
                dim,
                transpose,
                data,
            },
        );
    }

    // ── scalars and vectors ──────────────────────────────────────────────

    pub fn set_bool(&mut self, shader: &Shader<D>, name: &str, value: bool) {
        self.set_ints(shader, name, 1, &[value as i32]);
    }

    pub fn set_int(&mut self, shader: &Shader<D>, name: &str, value: i32) {
        self.set_ints(shader, name, 1, &[value]);
    }

    pub fn set_int2(&mut self, shader: &Shader<D>, name: &str, value: [i32; 2]) {
        self.set_ints(shader, name, 2, &value);
    }

    pub fn set_int3(&mut self, shader: &Shader<D>, name: &str, value: [i32; 3]) {
        self.set_ints(shader, name, 3, &value);
    }

    pub fn set_int4(&mut self, shader: &Shader<D>, name: &str, value: [i32; 4]) {
        self.set_ints(shader, name, 4, &value);
    }

    pub fn set_float(&mut self, shader: &Shader<D>, name: &str, value: f32) {
        self.set_floats(shader, name, 1, &[value]);
    }

    pub fn set_float2(&mut self, shader: &Shader<D>, name: &str, value: [f32; 2]) {
        self.set_floats(shader, name, 2, &value);
    }

    pub fn set_float3(&mut self, shader: &Shader<D>, name: &str, value: [f32; 3]) {
        self.set_floats(shader, name, 3, &value);
    }

    pub fn set_float4(&mut self, shader: &Shader<D>, name: &str, value: [f32; 4]) {
        self.set_floats(shader, name, 4, &value);
    }

    /// Points a sampler at texture unit `unit`.
    pub fn set_sampler(&mut self, shader: &Shader<D>, name: &str, unit: u32) {
        self.set_ints(shader, name, 1, &[unit as i32]);
    }

    // ── arrays ───────────────────────────────────────────────────────────

    pub fn set_int_array(&mut self, shader: &Shader<D>, name: &str, values: &[i32]) {
        self.set_ints(shader, name, 1, values);
    }

    pub fn set_float_array(&mut self, shader: &Shader<D>, name: &str, values: &[f32]) {
        self.set_floats(shader, name, 1, values);
    }

    pub fn set_vec2_array(&mut self, shader: &Shader<D>, name: &str, values: &[[f32; 2]]) {
        self.set_floats(shader, name, 2, bytemuck::cast_slice(values));
    }

    pub fn set_vec3_array(&mut self, shader: &Shader<D>, name: &str, values: &[[f32; 3]]) {
        self.set_floats(shader, name, 3, bytemuck::cast_slice(values));
    }

    pub fn set_vec4_array(&mut self, shader: &Shader<D>, name: &str, values: &[[f32; 4]]) {
        self.set_floats(shader, name, 4, bytemuck::cast_slice(values));
    }

    // ── matrices ─────────────────────────────────────────────────────────
    //
    // Column-major unless the context was configured to transpose.

    pub fn set_mat2(&mut self, shader: &Shader<D>, name: &str, value: [f32; 4]) {
        self.set_matrices(shader, name, 2, &value);
    }

    pub fn set_mat3(&mut self, shader: &Shader<D>, name: &str, value: [f32; 9]) {
        self.set_matrices(shader, name, 3, &value);
    }

    pub fn set_mat4(&mut self, shader: &Shader<D>, name: &str, value: &Mat4) {
        self.set_matrices(shader, name, 4, value.as_array());
    }

    pub fn set_mat4_array(&mut self, shader: &Shader<D>, name: &str, values: &[Mat4]) {
        self.set_matrices(shader, name, 4, bytemuck::cast_slice(values));
    }
}
