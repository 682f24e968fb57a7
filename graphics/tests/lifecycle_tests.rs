//! Integration tests for the context loss/restore cycle.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{make_test_pass, test_device, triangle};
use vermeil_graphics::DeviceEvent;
use vermeil_graphics::backend::BackendCall;
use vermeil_graphics::resources::{TextureDescriptor, TextureFormat};

#[test]
fn test_lost_frame_is_inert_but_counts_time() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();
    device.set_fps_window(Duration::from_millis(1));

    device.notify_context_lost();
    assert!(device.is_lost());

    backend.take_calls();
    std::thread::sleep(Duration::from_millis(5));
    device.frame();
    std::thread::sleep(Duration::from_millis(5));
    let stats = device.frame();

    // Counters reset, no backend traffic, no draws, no error check.
    assert_eq!(stats.instance_total, 0);
    assert_eq!(backend.call_count(), 0);
    // Timers advanced: the FPS window completed while lost.
    assert!(stats.fps > 0.0);
}

#[test]
fn test_loss_is_idempotent_per_cycle() {
    let (_, mut device) = test_device();
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    device.on_event(move |event| captured.lock().unwrap().push(*event));

    device.notify_context_lost();
    device.notify_context_lost();
    assert_eq!(*events.lock().unwrap(), vec![DeviceEvent::Lose]);
}

#[test]
fn test_restore_requeries_and_restores_each_resource_once() {
    let (backend, mut device) = test_device();
    let _pass = make_test_pass(&mut device, "p");
    let _mesh = device.make_mesh(triangle()).unwrap();
    let _texture = device
        .make_texture(TextureDescriptor::new(32, 32, TextureFormat::Rgba8))
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    device.on_event(move |event| captured.lock().unwrap().push(*event));

    device.notify_context_lost();
    backend.set_extensions(vec!["OES_texture_float".to_string()]);
    backend.take_calls();
    device.notify_context_restored().unwrap();
    assert!(!device.is_lost());

    // One reconstruction per resource: mesh buffer, texture, the default
    // depth buffer, and the pass program. The default (surface) target
    // owns no framebuffer object.
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::CreateBuffer(..))),
        1
    );
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::CreateTexture(..))),
        1
    );
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::CreateRenderbuffer(..))),
        1
    );
    assert_eq!(
        backend.count_matching(|c| matches!(c, BackendCall::CreateProgram(_))),
        1
    );

    // Extension cache was re-queried.
    assert!(device.extensions().has("OES_texture_float"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![DeviceEvent::Lose, DeviceEvent::Restore]
    );
}

#[test]
fn test_restore_without_loss_is_noop() {
    let (backend, mut device) = test_device();
    backend.take_calls();
    device.notify_context_restored().unwrap();
    assert_eq!(backend.call_count(), 0);
}

#[test]
fn test_resources_created_while_lost() {
    let (_, mut device) = test_device();
    device.notify_context_lost();

    // Resource management stays available while lost.
    let mesh = device.make_mesh(triangle()).unwrap();
    assert_eq!(device.mesh_count(), 1);
    assert!(mesh.buffers().is_some());

    device.notify_context_restored().unwrap();
    assert_eq!(device.mesh_count(), 1);
}

#[test]
fn test_drawing_resumes_after_restore() {
    let (backend, mut device) = test_device();
    let pass = make_test_pass(&mut device, "p");
    let mesh = device.make_mesh(triangle()).unwrap();
    device.stage("s", None);
    let material = device.material("m", None);
    material.set_pass("s", pass);
    device.instance("m", &mesh, None, false).unwrap();

    device.notify_context_lost();
    device.frame();
    assert_eq!(backend.draw_count(), 0);

    device.notify_context_restored().unwrap();
    backend.take_calls();
    let stats = device.frame();
    assert_eq!(stats.instance_drawn, 1);
    assert_eq!(backend.draw_count(), 1);
}
