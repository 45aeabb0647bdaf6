// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use aster_agents::{ResourceReference, ResourceRegistry, ThreadPoolScheduler};
use aster_core::{
    gpu::{GpuObject, HeadlessGpuContext},
    jobs::{Job, JobHandle, Scheduler},
    resource::{Resource, ResourceId, ResourceState, SourceMetadata, TextureFormat},
    ByteSource, ResourceConfig,
};
use aster_io::FolderResourceDatabase;
use aster_lanes::{
    loading::{TextureLoader, WHITE_TEXTURE},
    resources::{Composite, Font, Material, Mesh, Scene, SceneGraph, SceneNode, Shader, Texture},
    LoadContext, LoaderFactory, ResourceData, ResourceLoader,
};
use base64::Engine;
use std::{
    collections::VecDeque,
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Queues jobs until the test runs them.
#[derive(Default)]
struct ManualScheduler {
    queue: Mutex<VecDeque<(Job, JobHandle)>>,
    dispatched: AtomicUsize,
}

impl ManualScheduler {
    fn pop(&self) -> Option<(Job, JobHandle)> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Runs queued jobs, including the ones they enqueue, until none is left.
    fn run_all(&self) {
        while let Some((job, handle)) = self.pop() {
            job();
            handle.complete();
        }
    }

    fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl Scheduler for ManualScheduler {
    fn dispatch(&self, job: Job) -> JobHandle {
        let handle = JobHandle::new();
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().push_back((job, handle.clone()));
        handle
    }

    fn wait(&self, handle: &JobHandle) {
        while !handle.is_complete() {
            match self.pop() {
                Some((job, queued)) => {
                    job();
                    queued.complete();
                }
                None => break,
            }
        }
    }
}

/// Decodes textures and counts how often it was asked to.
#[derive(Default)]
struct CountingTextureLoader {
    calls: AtomicUsize,
}

impl ResourceLoader for CountingTextureLoader {
    fn name(&self) -> &'static str {
        "CountingTextureLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        TextureLoader.load(metadata, source, ctx)
    }
}

fn write(root: &Path, relative: &str, bytes: &[u8]) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn png(width: u32, height: u32) -> Result<Vec<u8>> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
    let mut bytes = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

fn config(root: &Path) -> Arc<ResourceConfig> {
    let mut config = ResourceConfig::with_root(root);
    config.staleness_check_interval_ms = 0;
    Arc::new(config)
}

fn registry_with(
    config: Arc<ResourceConfig>,
    factory: LoaderFactory,
    scheduler: Arc<dyn Scheduler>,
) -> Result<ResourceRegistry> {
    let factory = Arc::new(factory);
    let database = FolderResourceDatabase::open(&config, factory.clone());
    ResourceRegistry::new(
        Arc::new(database),
        factory,
        scheduler,
        Arc::new(HeadlessGpuContext::new()),
    )
}

fn registry(root: &Path, scheduler: Arc<dyn Scheduler>) -> Result<ResourceRegistry> {
    let config = config(root);
    registry_with(config.clone(), LoaderFactory::new(config), scheduler)
}

/// A triangle with a textured material, an undecodable second image and a
/// default scene.
fn triangle_gltf() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        buffer.extend_from_slice(&index.to_le_bytes());
    }
    buffer.extend_from_slice(&[0, 0]);

    let b64 = base64::engine::general_purpose::STANDARD;
    let json = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "name": "main", "nodes": [0] } ],
        "nodes": [ { "name": "tri", "mesh": 0 } ],
        "meshes": [ {
            "name": "tri",
            "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ]
        } ],
        "materials": [ {
            "name": "paint",
            "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } }
        } ],
        "textures": [ { "source": 0 } ],
        "images": [
            { "name": "albedo", "uri": format!("data:image/png;base64,{}", b64.encode(png(2, 2)?)) },
            { "name": "broken", "uri": format!("data:image/png;base64,{}", b64.encode(b"not an image")) }
        ],
        "buffers": [ {
            "byteLength": buffer.len(),
            "uri": format!("data:application/octet-stream;base64,{}", b64.encode(&buffer))
        } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    });
    Ok(serde_json::to_vec(&json)?)
}

#[test]
fn loading_twice_shares_one_instance() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(4, 4)?)?;
    let scheduler = Arc::new(ManualScheduler::default());
    let registry = registry(dir.path(), scheduler.clone())?;

    let first = registry.load::<Texture>("textures/a.png");
    let second = registry.load::<Texture>("textures/a.png");
    assert_eq!(first.get_state(), ResourceState::Pending);
    assert_eq!(second.get_state(), ResourceState::Pending);
    assert_eq!(scheduler.dispatched(), 1);

    scheduler.run_all();
    assert_eq!(first.get_state(), ResourceState::Loaded);
    assert_eq!(second.get_state(), ResourceState::Loaded);
    let (a, b) = (first.get().unwrap(), second.get().unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!((a.width, a.height), (4, 4));
    Ok(())
}

#[test]
fn concurrent_loads_decode_once() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(8, 8)?)?;

    let config = config(dir.path());
    let counting = Arc::new(CountingTextureLoader::default());
    let mut factory = LoaderFactory::new(config.clone());
    factory.register(aster_core::resource::ResourceType::Texture, counting.clone());
    let registry = registry_with(config, factory, Arc::new(ThreadPoolScheduler::new(4)?))?;

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| registry.load::<Texture>("textures/a.png"));
        }
    });
    registry.wait_idle();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        registry.state(&ResourceId::new("textures/a.png")),
        ResourceState::Loaded
    );
    Ok(())
}

#[test]
fn states_only_move_forward() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    let scheduler = Arc::new(ManualScheduler::default());
    let registry = registry(dir.path(), scheduler.clone())?;

    let good = registry.load::<Texture>("textures/a.png");
    let bad = registry.load::<Texture>("textures/missing.png");
    assert_eq!(good.get_state(), ResourceState::Pending);
    assert_eq!(bad.get_state(), ResourceState::Pending);

    scheduler.run_all();
    assert_eq!(good.get_state(), ResourceState::Loaded);
    assert_eq!(bad.get_state(), ResourceState::Error);

    // Settled ids are never loaded again.
    let dispatched = scheduler.dispatched();
    let again = registry.load::<Texture>("textures/missing.png");
    assert_eq!(again.get_state(), ResourceState::Error);
    assert_eq!(scheduler.dispatched(), dispatched);
    assert_eq!(registry.stats().errored, 1);
    Ok(())
}

#[test]
fn immediate_load_returns_settled_handles() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    let registry = registry(dir.path(), Arc::new(ThreadPoolScheduler::new(2)?))?;

    let texture = registry.immediate_load::<Texture>("textures/a.png");
    assert_eq!(texture.get_state(), ResourceState::Loaded);
    let missing = registry.immediate_load::<Texture>("textures/b.png");
    assert_eq!(missing.get_state(), ResourceState::Error);
    Ok(())
}

#[test]
fn composite_children_load_independently() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "props/tri.gltf", &triangle_gltf()?)?;
    let registry = registry(dir.path(), Arc::new(ThreadPoolScheduler::new(4)?))?;

    let parent = registry.immediate_load::<Composite>("props/tri.gltf");
    registry.wait_idle();
    assert_eq!(parent.get_state(), ResourceState::Loaded);
    let composite = parent.get().unwrap();
    assert_eq!(composite.len(), 5);

    let child = |name: &str| ResourceId::new(format!("props/tri.gltf/{name}"));
    for name in ["Texture0-albedo", "Material0-paint", "Mesh0-tri", "Scene0-main"] {
        let id = child(name);
        assert_eq!(registry.state(&id), ResourceState::Loaded, "{id}");
        assert!(registry.metadata(&id).unwrap().dependencies.is_empty());
    }
    // A broken child does not affect its parent or its siblings.
    assert_eq!(registry.state(&child("Texture1-broken")), ResourceState::Error);

    let mesh = registry.get::<Mesh>(child("Mesh0-tri")).get().unwrap();
    assert_eq!((mesh.vertex_count, mesh.index_count), (3, 3));
    let material = registry.get::<Material>(child("Material0-paint")).get().unwrap();
    assert_eq!(material.texture("base_color"), Some(&child("Texture0-albedo")));
    assert_eq!(composite.default_scene, Some(child("Scene0-main")));
    Ok(())
}

#[test]
fn declared_dependencies_are_enqueued() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    write(dir.path(), "shaders/stone.slang", b"float4 main() { return 1; }")?;
    write(
        dir.path(),
        "materials/stone.mtl",
        br#"{ "shader": "shaders/stone.slang", "textures": { "base_color": "textures/a.png" } }"#,
    )?;
    let scheduler = Arc::new(ManualScheduler::default());
    let registry = registry(dir.path(), scheduler.clone())?;
    let metadata = registry
        .database()
        .find(&ResourceId::new("materials/stone.mtl"))?;
    assert_eq!(metadata.dependencies, vec![ResourceId::new("shaders/stone.slang")]);

    let material = registry.load::<Material>("materials/stone.mtl");
    scheduler.run_all();
    assert_eq!(
        material.get().unwrap().shader,
        ResourceId::new("shaders/stone.slang")
    );
    assert!(registry.get::<Shader>("shaders/stone.slang").is_valid());
    assert!(registry.get::<Texture>("textures/a.png").is_valid());
    Ok(())
}

#[test]
fn clones_are_released_on_drop() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    let registry = registry(dir.path(), Arc::new(aster_core::jobs::InlineScheduler))?;
    let id = ResourceId::new("textures/a.png");

    let handle = registry.load::<Texture>(id.clone());
    let clones: Vec<_> = (0..5).map(|_| handle.clone()).collect();
    assert_eq!(registry.references().count(&id), 6);
    drop(clones);
    drop(handle);
    assert_eq!(registry.references().count(&id), 0);
    assert_eq!(registry.stats().references, 0);
    Ok(())
}

#[test]
fn unknown_null_and_mismatched_handles() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    let registry = registry(dir.path(), Arc::new(aster_core::jobs::InlineScheduler))?;

    assert_eq!(
        registry.get::<Texture>("nowhere.png").get_state(),
        ResourceState::Missing
    );
    assert_eq!(
        ResourceReference::<Texture>::null().get_state(),
        ResourceState::Null
    );
    assert_eq!(registry.load::<Texture>("").get_state(), ResourceState::Null);

    let wrong = registry.load::<Mesh>("textures/a.png");
    assert_eq!(wrong.get_state(), ResourceState::Error);
    assert!(wrong.get().is_none());
    assert!(wrong.cast::<Texture>().is_valid());
    assert!(wrong.cast::<dyn Resource>().get().is_some());
    Ok(())
}

#[test]
fn edited_scenes_are_saved_back() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(
        dir.path(),
        "levels/one.scene",
        br#"{ "name": "one", "nodes": [ { "name": "root" } ] }"#,
    )?;
    let registry = registry(dir.path(), Arc::new(aster_core::jobs::InlineScheduler))?;
    let id = ResourceId::new("levels/one.scene");

    let scene = registry.immediate_load::<Scene>(id.clone()).get().unwrap();
    scene.edit(|graph| graph.nodes.push(SceneNode::new("camera")));
    assert!(registry.mark_dirty(&id));
    assert_eq!(registry.stats().dirty, 1);

    assert_eq!(registry.save_dirty(), 1);
    assert_eq!(registry.stats().dirty, 0);
    let saved: SceneGraph = serde_json::from_slice(&fs::read(dir.path().join("levels/one.scene"))?)?;
    assert_eq!(saved.nodes.len(), 2);
    assert_eq!(saved.nodes[1].name, "camera");

    // Textures have no write-back path.
    let white = ResourceId::new(WHITE_TEXTURE);
    assert!(registry.mark_dirty(&white));
    assert!(registry.save(&white).is_err());
    Ok(())
}

#[test]
fn allocate_keeps_the_first_registration() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let registry = registry(dir.path(), Arc::new(aster_core::jobs::InlineScheduler))?;
    assert!(registry.get::<Texture>(WHITE_TEXTURE).is_valid());

    let texture = |id| Texture {
        width: 1,
        height: 1,
        format: TextureFormat::Rgba8,
        hdr: false,
        gpu_object: GpuObject(id),
    };
    let first = registry.allocate("procedural/noise", texture(100));
    let second = registry.allocate("procedural/noise", texture(200));
    assert_eq!(second.gpu_object, GpuObject(200));

    let stored = registry.get::<Texture>("procedural/noise").get().unwrap();
    assert!(Arc::ptr_eq(&stored, &first));
    Ok(())
}

#[test]
fn categories_without_a_loader_fail_cleanly() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "fonts/mono.ttf", &[0, 1, 0, 0, 0, 0, 0, 0])?;
    let config = config(dir.path());
    let mut factory = LoaderFactory::empty(config.clone());
    factory.register(aster_core::resource::ResourceType::Texture, Arc::new(TextureLoader));
    let registry = registry_with(config, factory, Arc::new(aster_core::jobs::InlineScheduler))?;

    let font = registry.load::<Font>("fonts/mono.ttf");
    assert_eq!(font.get_state(), ResourceState::Error);
    Ok(())
}

#[test]
fn update_revalidates_without_reloading() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    write(dir.path(), "textures/a.png", &png(2, 2)?)?;
    let mut config = ResourceConfig::with_root(dir.path());
    config.staleness_check_interval_ms = 1;
    let config = Arc::new(config);
    let registry = registry_with(
        config.clone(),
        LoaderFactory::new(config),
        Arc::new(aster_core::jobs::InlineScheduler),
    )?;

    let texture = registry.load::<Texture>("textures/a.png");
    fs::remove_file(dir.path().join("textures/a.png"))?;
    thread::sleep(Duration::from_millis(5));
    registry.update();

    assert_eq!(texture.get_state(), ResourceState::Loaded);
    assert_eq!(registry.stats().pending, 0);
    Ok(())
}
