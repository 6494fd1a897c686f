//! Wavefront OBJ export of a [`MemoryScene`]
//!
//! Vertices are written in world space. Each object becomes an `o` block,
//! grouped (`g`) by its collection when it has one.

use super::memory::MemoryScene;
use super::ObjectKind;
use std::fmt::Write;

pub fn to_obj(scene: &MemoryScene) -> String {
    let mut out = String::from("# ladder scene export\n");
    let mut vertex_offset = 1;

    for (object, collection) in scene.objects_with_collections() {
        if object.kind != ObjectKind::Mesh {
            continue;
        }
        let Some(mesh) = object.mesh.as_ref() else {
            continue;
        };

        let _ = writeln!(out, "o {}", object.name);
        if let Some(collection) = collection {
            let _ = writeln!(out, "g {}", collection);
        }
        let _ = writeln!(out, "s {}", if object.smooth { "1" } else { "off" });

        for v in object.world_vertices() {
            let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
        }
        for face in &mesh.faces {
            let _ = writeln!(
                out,
                "f {} {} {}",
                face[0] + vertex_offset,
                face[1] + vertex_offset,
                face[2] + vertex_offset
            );
        }
        vertex_offset += mesh.vertices.len();
    }
    out
}
