//! WGSL reflection.
//!
//! The raster contract addresses vertex inputs and uniforms by name. WGSL
//! shaders bind by `@location` and by struct offset instead, so every stage is
//! parsed with naga and its interface recorded here. Each stage is expected to
//! declare at most one uniform struct at `@group(0) @binding(0)`.

use glint_test_utils::{RasterError, ShaderStage};
use naga::valid::{Capabilities, ValidationFlags, Validator};

/// A vertex shader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    /// Number of f32 components (1 for scalars).
    pub components: u32,
}

/// One member of the uniform struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// Interface of a single compiled stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub entry_point: String,
    /// Vertex inputs (empty for fragment stages).
    pub inputs: Vec<VertexInput>,
    /// Locations passed on to the next stage (vertex) or read from the
    /// previous one (fragment).
    pub varyings: Vec<u32>,
    pub uniforms: Vec<UniformMember>,
    /// Byte size of the uniform struct, 0 if there is none.
    pub uniform_size: u32,
}

impl ShaderReflection {
    pub fn uniform(&self, name: &str) -> Option<&UniformMember> {
        self.uniforms.iter().find(|member| member.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&VertexInput> {
        self.inputs.iter().find(|input| input.name == name)
    }
}

/// The combined interface of a linked vertex and fragment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Vertex inputs sorted by location.
    pub attributes: Vec<VertexInput>,
    pub uniforms: Vec<UniformMember>,
    pub uniform_size: u32,
}

impl ProgramLayout {
    pub fn attribute(&self, name: &str) -> Option<&VertexInput> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformMember> {
        self.uniforms.iter().find(|member| member.name == name)
    }
}

/// Parse, validate and reflect a WGSL stage.
pub fn reflect_wgsl(stage: ShaderStage, source: &str) -> Result<ShaderReflection, RasterError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| RasterError::ShaderCompile {
        stage,
        log: err.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| RasterError::ShaderCompile {
            stage,
            log: err.emit_to_string(source),
        })?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga_stage)
        .ok_or_else(|| RasterError::ShaderCompile {
            stage,
            log: format!("no @{} entry point", stage),
        })?;

    let mut reflection = ShaderReflection {
        entry_point: entry.name.clone(),
        ..Default::default()
    };

    for argument in &entry.function.arguments {
        let name = argument.name.clone().unwrap_or_default();
        let mut found = |input: VertexInput| match stage {
            ShaderStage::Vertex => reflection.inputs.push(input),
            ShaderStage::Fragment => reflection.varyings.push(input.location),
        };
        collect_locations(&module, argument.ty, argument.binding.as_ref(), name, &mut found);
    }

    if stage == ShaderStage::Vertex
        && let Some(result) = &entry.function.result
    {
        let mut found = |output: VertexInput| reflection.varyings.push(output.location);
        collect_locations(
            &module,
            result.ty,
            result.binding.as_ref(),
            String::new(),
            &mut found,
        );
    }

    reflection.inputs.sort_by_key(|input| input.location);
    reflection.varyings.sort_unstable();

    for (_, global) in module.global_variables.iter() {
        let is_block = global.space == naga::AddressSpace::Uniform
            && global
                .binding
                .as_ref()
                .is_some_and(|binding| binding.group == 0 && binding.binding == 0);
        if !is_block {
            continue;
        }

        match &module.types[global.ty].inner {
            naga::TypeInner::Struct { members, span } => {
                reflection.uniform_size = *span;
                for member in members {
                    let Some(name) = &member.name else { continue };
                    reflection.uniforms.push(UniformMember {
                        name: name.clone(),
                        offset: member.offset,
                        size: module.types[member.ty].inner.size(module.to_ctx()),
                    });
                }
            }
            _ => {
                return Err(RasterError::ShaderCompile {
                    stage,
                    log: "uniform at @group(0) @binding(0) must be a struct".to_string(),
                });
            }
        }
    }

    Ok(reflection)
}

/// Walk a function argument or result, flattening structs, and report every
/// `@location` binding.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    name: String,
    found: &mut dyn FnMut(VertexInput),
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            let components = match &module.types[ty].inner {
                naga::TypeInner::Vector { size, .. } => *size as u32,
                _ => 1,
            };
            found(VertexInput {
                name,
                location: *location,
                components,
            });
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.clone().unwrap_or_default(),
                        found,
                    );
                }
            }
        }
    }
}

/// Check that two stages fit together and merge their interfaces.
///
/// Both stages may declare the uniform struct; every member they share must
/// sit at the same offset with the same size. Every location the fragment
/// stage reads must be written by the vertex stage.
pub fn link_layout(
    vertex: &ShaderReflection,
    fragment: &ShaderReflection,
) -> Result<ProgramLayout, RasterError> {
    let mut uniforms = vertex.uniforms.clone();
    for member in &fragment.uniforms {
        match vertex.uniform(&member.name) {
            Some(existing) if existing != member => {
                return Err(RasterError::ProgramLink {
                    log: format!(
                        "uniform '{}' declared at offset {} ({} bytes) in the vertex stage \
                         but at offset {} ({} bytes) in the fragment stage",
                        member.name, existing.offset, existing.size, member.offset, member.size
                    ),
                });
            }
            Some(_) => {}
            None => uniforms.push(member.clone()),
        }
    }
    uniforms.sort_by_key(|member| member.offset);

    for location in &fragment.varyings {
        if !vertex.varyings.contains(location) {
            return Err(RasterError::ProgramLink {
                log: format!(
                    "fragment input @location({}) is not written by the vertex stage",
                    location
                ),
            });
        }
    }

    Ok(ProgramLayout {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes: vertex.inputs.clone(),
        uniforms,
        uniform_size: vertex.uniform_size.max(fragment.uniform_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct Uniforms {
    transform: mat4x4<f32>,
    color: vec4<f32>,
    width: f32,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) fade: f32,
}

@vertex
fn vs_main(@location(1) tangent: vec2<f32>, @location(0) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.transform * vec4<f32>(position + tangent * u.width, 0.0, 1.0);
    out.fade = 1.0;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
struct Uniforms {
    transform: mat4x4<f32>,
    color: vec4<f32>,
    width: f32,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;

@fragment
fn fs_main(@location(0) fade: f32) -> @location(0) vec4<f32> {
    return u.color * fade;
}
"#;

    #[test]
    fn test_vertex_inputs_sorted_by_location() {
        let reflection = reflect_wgsl(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(reflection.entry_point, "vs_main");
        assert_eq!(
            reflection.inputs,
            vec![
                VertexInput {
                    name: "position".into(),
                    location: 0,
                    components: 2
                },
                VertexInput {
                    name: "tangent".into(),
                    location: 1,
                    components: 2
                },
            ]
        );
        assert_eq!(reflection.varyings, vec![0]);
    }

    #[test]
    fn test_uniform_offsets() {
        let reflection = reflect_wgsl(ShaderStage::Vertex, VERTEX).unwrap();
        let color = reflection.uniform("color").unwrap();
        assert_eq!((color.offset, color.size), (64, 16));
        let width = reflection.uniform("width").unwrap();
        assert_eq!((width.offset, width.size), (80, 4));
        // Uniform structs round up to 16 bytes.
        assert_eq!(reflection.uniform_size, 96);
    }

    #[test]
    fn test_syntax_error_reports_compile_failure() {
        let err = reflect_wgsl(ShaderStage::Fragment, "fn fs_main( {").unwrap_err();
        assert!(matches!(
            err,
            RasterError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_entry_point() {
        let err = reflect_wgsl(ShaderStage::Vertex, FRAGMENT).unwrap_err();
        let RasterError::ShaderCompile { log, .. } = err else {
            panic!("expected compile error");
        };
        assert!(log.contains("vertex"));
    }

    #[test]
    fn test_link_merges_layouts() {
        let vs = reflect_wgsl(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = reflect_wgsl(ShaderStage::Fragment, FRAGMENT).unwrap();
        let layout = link_layout(&vs, &fs).unwrap();

        assert_eq!(layout.vertex_entry, "vs_main");
        assert_eq!(layout.fragment_entry, "fs_main");
        assert_eq!(layout.attribute("tangent").map(|a| a.location), Some(1));
        assert_eq!(layout.uniform("transform").map(|u| u.offset), Some(0));
        assert!(layout.uniform("missing").is_none());
    }

    #[test]
    fn test_link_rejects_mismatched_uniforms() {
        let vs = reflect_wgsl(ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = FRAGMENT.replace(
            "transform: mat4x4<f32>,\n    color: vec4<f32>,",
            "color: vec4<f32>,\n    transform: mat4x4<f32>,",
        );
        let fs = reflect_wgsl(ShaderStage::Fragment, &fragment).unwrap();
        assert!(matches!(
            link_layout(&vs, &fs),
            Err(RasterError::ProgramLink { .. })
        ));
    }

    #[test]
    fn test_link_rejects_unwritten_varying() {
        let vs = reflect_wgsl(ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = FRAGMENT.replace("@location(0) fade", "@location(3) fade");
        let fs = reflect_wgsl(ShaderStage::Fragment, &fragment).unwrap();
        let err = link_layout(&vs, &fs).unwrap_err();
        assert!(err.to_string().contains("@location(3)"));
    }

    #[test]
    fn test_plot_shaders_reflect() {
        let vs = reflect_wgsl(
            ShaderStage::Vertex,
            include_str!("../../glint-plot/src/shaders/line_dashed.vert.wgsl"),
        )
        .unwrap();
        let fs = reflect_wgsl(
            ShaderStage::Fragment,
            include_str!("../../glint-plot/src/shaders/line_dashed.frag.wgsl"),
        )
        .unwrap();
        let layout = link_layout(&vs, &fs).unwrap();
        let names: Vec<_> = layout.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["position", "tangent", "linelength"]);
        assert_eq!(layout.uniform("width").map(|u| u.offset), Some(152));
    }
}
