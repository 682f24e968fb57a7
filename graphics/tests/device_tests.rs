//! Integration tests for the device registry, grid, and frame driver.

mod common;

use std::sync::{Arc, Mutex};

use common::{make_test_pass, test_device, test_device_with_surface, triangle};
use vermeil_core::mesh::generators::{generate_cube, generate_quad};
use vermeil_graphics::backend::BackendCall;
use vermeil_graphics::{DeviceEvent, RenderError, UniformValue};

// ============================================================================
// Grid upsert and ordering
// ============================================================================

#[test]
fn test_stage_upsert_returns_identical_object() {
    let (_, mut device) = test_device();
    let first = device.stage("main", None);
    let again = device.stage("main", None);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(device.stage_order(), vec!["main"]);
}

#[test]
fn test_material_upsert_returns_identical_object() {
    let (_, mut device) = test_device();
    device.material("a", None);
    device.material("b", None);
    let first = device.material("a", None);
    let again = device.material("a", None);
    assert!(Arc::ptr_eq(&first, &again));
    // Upsert of an existing name never reorders the grid.
    assert_eq!(device.material_order(), vec!["a", "b"]);
}

#[test]
fn test_stage_splices_before_existing() {
    let (_, mut device) = test_device();
    device.stage("existing", None);
    device.stage("new", Some("existing"));

    let order = device.stage_order();
    let new_index = order.iter().position(|n| n == "new").unwrap();
    let existing_index = order.iter().position(|n| n == "existing").unwrap();
    assert!(new_index < existing_index);
}

#[test]
fn test_splice_with_unknown_anchor_appends() {
    let (_, mut device) = test_device();
    device.stage("a", None);
    device.stage("b", Some("missing"));
    assert_eq!(device.stage_order(), vec!["a", "b"]);
}

#[test]
fn test_instance_unknown_material_is_lookup_error() {
    let (_, mut device) = test_device();
    device.material("known", None);
    let mesh = device.make_mesh(triangle()).unwrap();

    let result = device.instance("unknown", &mesh, None, true);
    assert!(matches!(result, Err(RenderError::Lookup(_))));
    // No bin was touched.
    assert_eq!(device.bin_len("known"), 0);
    assert_eq!(device.bin_len("unknown"), 0);
}

#[test]
fn test_instance_resolves_material_by_reference() {
    let (_, mut device) = test_device();
    let material = device.material("m", None);
    let mesh = device.make_mesh(triangle()).unwrap();

    device.instance(&material, &mesh, None, true).unwrap();
    assert_eq!(device.bin_len("m"), 1);
}

#[test]
fn test_instance_removal_uses_back_index() {
    let (_, mut device) = test_device();
    device.material("m", None);
    let mesh = device.make_mesh(triangle()).unwrap();

    let instances: Vec<_> = (0..4)
        .map(|_| device.instance("m", &mesh, None, true).unwrap())
        .collect();
    assert!(device.remove_instance(&instances[1]));
    assert!(!device.remove_instance(&instances[1]));
    assert_eq!(device.bin_len("m"), 3);
}

// ============================================================================
// Frame driver
// ============================================================================

#[test]
fn test_empty_grid_frame_is_all_zero() {
    let (_, mut device) = test_device();
    let stats = device.frame();
    assert_eq!(stats.vertex_total, 0);
    assert_eq!(stats.vertex_drawn, 0);
    assert_eq!(stats.primitive_total, 0);
    assert_eq!(stats.instance_total, 0);
}

#[test]
fn test_single_instance_scenario_is_deterministic() {
    let (_, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();

    let first = device.frame();
    let second = device.frame();

    assert_eq!(first.vertex_total, 3);
    assert_eq!(first.vertex_drawn, 3);
    assert_eq!(first.primitive_total, 1);
    assert_eq!(first.instance_drawn, 1);

    assert_eq!(first.vertex_total, second.vertex_total);
    assert_eq!(first.vertex_drawn, second.vertex_drawn);
    assert_eq!(first.primitive_total, second.primitive_total);
    assert_eq!(first.primitive_drawn, second.primitive_drawn);
    assert_eq!(first.instance_total, second.instance_total);
    assert_eq!(first.instance_drawn, second.instance_drawn);
}

#[test]
fn test_bin_skipped_without_pass_or_instances() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    device.stage("s", None);
    // Material with a pass but an empty bin.
    let with_pass = device.material("with_pass", None);
    with_pass.set_pass("s", pass);
    // Material with an instance but no pass for this stage.
    device.material("no_pass", None);
    let mesh = device.make_mesh(triangle()).unwrap();
    device.instance("no_pass", &mesh, None, true).unwrap();

    backend.take_calls();
    let stats = device.frame();

    assert_eq!(stats.instance_total, 0);
    assert_eq!(backend.draw_count(), 0);
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::BindProgram(_))),
        0
    );
}

#[test]
fn test_pass_window_spans_stage_boundaries() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "shared");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s1", None);
    device.stage("s2", None);
    let material = device.material("m", None);
    material.set_pass("s1", pass.clone());
    material.set_pass("s2", pass);
    device.instance("m", &mesh, None, false).unwrap();

    backend.take_calls();
    device.frame();

    // Same pass across both stages: one begin, no re-bind.
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::BindProgram(_))),
        1
    );
    assert_eq!(backend.draw_count(), 2);
}

#[test]
fn test_pass_switch_ends_previous_and_diffs() {
    let (backend, mut device) = test_device();
    let pass_a = make_test_pass(&mut device, "a");
    let pass_b = make_test_pass(&mut device, "b");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material_a = device.material("ma", None);
    material_a.set_pass("s", pass_a.clone());
    let material_b = device.material("mb", None);
    material_b.set_pass("s", pass_b.clone());
    device.instance("ma", &mesh, None, false).unwrap();
    device.instance("mb", &mesh, None, false).unwrap();

    backend.take_calls();
    device.frame();

    let programs: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::BindProgram(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(programs.len(), 2);
    assert_eq!(programs[0], pass_a.program().unwrap());
    assert_eq!(programs[1], pass_b.program().unwrap());
    // The second begin diffs against the first pass: identical scalar
    // state emits no depth toggle.
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::DepthTestEnabled(_))),
        1 // only the first activation
    );
}

#[test]
fn test_visible_sort_is_descending_mesh_creation_order() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    // Quad first (arena index 0, 6 indexed elements), triangle second
    // (arena index 1, 3 non-indexed elements).
    let quad = device.make_mesh(generate_quad(1.0, 1.0)).unwrap();
    let tri = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &quad, None, false).unwrap();
    device.instance("m", &tri, None, false).unwrap();

    backend.take_calls();
    device.frame();

    let draws: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::Draw(_, count, indexed) => Some((count, indexed)),
            _ => None,
        })
        .collect();
    // Higher arena index draws first.
    assert_eq!(draws, vec![(3, false), (6, true)]);
}

#[test]
fn test_mesh_rebinds_only_on_identity_change() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let shared = device.make_mesh(triangle()).unwrap();
    let other = device.make_mesh(generate_cube(1.0)).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    // Two instances share a mesh; the sort keeps them adjacent.
    device.instance("m", &shared, None, false).unwrap();
    device.instance("m", &other, None, false).unwrap();
    device.instance("m", &shared, None, false).unwrap();

    backend.take_calls();
    device.frame();

    assert_eq!(backend.draw_count(), 3);
    // cube (index 1) first, then the two shared-mesh instances: 2 binds.
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::BindVertexBuffer(_))),
        2
    );
}

#[test]
fn test_culled_instances_count_toward_totals_only() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    let stage = device.stage("s", None);
    // A view-projection whose frustum excludes far-away instances.
    stage.set_view(vermeil_core::math::look_at_rh(
        &vermeil_core::math::Vec3::new(0.0, 0.0, 5.0),
        &vermeil_core::math::Vec3::new(0.0, 0.0, 0.0),
        &vermeil_core::math::Vec3::y(),
    ));
    stage.set_projection(vermeil_core::math::perspective_rh(
        std::f32::consts::FRAC_PI_2,
        1.0,
        0.1,
        100.0,
    ));
    let material = device.material("m", None);
    material.set_pass("s", pass);

    device.instance("m", &mesh, None, true).unwrap();
    device
        .instance(
            "m",
            &mesh,
            Some(vermeil_core::math::mat4_from_translation(
                vermeil_core::math::Vec3::new(1000.0, 0.0, 0.0),
            )),
            true,
        )
        .unwrap();

    backend.take_calls();
    let stats = device.frame();

    assert_eq!(stats.instance_total, 2);
    assert_eq!(stats.instance_drawn, 1);
    assert_eq!(stats.vertex_total, 6);
    assert_eq!(stats.vertex_drawn, 3);
    assert_eq!(backend.draw_count(), 1);
}

// ============================================================================
// Uniform scopes
// ============================================================================

#[test]
fn test_uniform_scope_precedence() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    let stage = device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    let instance = device.instance("m", &mesh, None, false).unwrap();

    // The same name at every scope: instance wins.
    device.set_uniform("u_tint", UniformValue::Float(1.0));
    stage.set_uniform("u_tint", UniformValue::Float(2.0));
    material.set_uniform("u_tint", UniformValue::Float(3.0));
    instance.set_uniform("u_tint", UniformValue::Float(4.0));

    backend.take_calls();
    device.frame();

    let tints: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::SetUniform(name, value) if name == "u_tint" => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(tints, vec![UniformValue::Float(4.0)]);
}

#[test]
fn test_material_overrides_stage_and_device() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    let stage = device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();

    device.set_uniform("u_tint", UniformValue::Float(1.0));
    stage.set_uniform("u_tint", UniformValue::Float(2.0));
    material.set_uniform("u_tint", UniformValue::Float(3.0));

    backend.take_calls();
    device.frame();

    let tints: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::SetUniform(name, value) if name == "u_tint" => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(tints, vec![UniformValue::Float(3.0)]);
}

#[test]
fn test_time_placeholders_resolve_at_bind_time() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();

    device.set_uniform("u_time", UniformValue::Time);
    device.set_uniform("u_delta", UniformValue::DeltaTime);
    // The registry keeps the placeholder itself.
    assert_eq!(device.uniform("u_time"), Some(UniformValue::Time));

    backend.take_calls();
    device.frame();

    for call in backend.calls() {
        if let BackendCall::SetUniform(name, value) = call {
            if name == "u_time" || name == "u_delta" {
                assert!(
                    matches!(value, UniformValue::Float(_)),
                    "{name} bound as {value:?}"
                );
            }
        }
    }
}

// ============================================================================
// Resize detection
// ============================================================================

#[test]
fn test_resize_fires_once_with_payload() {
    let (backend, mut device) = test_device_with_surface(300, 200);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    device.on_event(move |event| {
        if let DeviceEvent::Resize { width, height } = event {
            captured.lock().unwrap().push((*width, *height));
        }
    });

    device.frame();
    assert!(seen.lock().unwrap().is_empty());

    backend.set_surface_size(800, 600);
    device.frame();
    assert_eq!(*seen.lock().unwrap(), vec![(800, 600)]);
    // Default depth buffer tracked the resize.
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::ResizeRenderbuffer(_, 800, 600))),
        1
    );

    device.frame();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_resize_precedes_draws() {
    let (backend, mut device) = test_device_with_surface(300, 200);
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();

    backend.set_surface_size(640, 480);
    backend.take_calls();
    device.frame();

    let calls = backend.calls();
    let resize_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::ResizeRenderbuffer(..)))
        .expect("resize should have happened");
    let draw_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::Draw(..)))
        .expect("draw should have happened");
    assert!(resize_at < draw_at);
}

// ============================================================================
// Aggregated backend error check
// ============================================================================

#[test]
fn test_backend_error_is_aggregated_not_raised() {
    let (backend, mut device) = test_device();
    backend.inject_error("simulated backend fault");

    let stats = device.frame();
    assert_eq!(stats.instance_total, 0);
    assert_eq!(device.backend_error(), Some("simulated backend fault"));

    // Next clean frame clears it.
    device.frame();
    assert_eq!(device.backend_error(), None);
}
