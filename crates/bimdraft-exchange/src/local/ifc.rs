//! ISO-10303-21 (IFC4) output for the in-process BIM-exchange path.
//!
//! Each object becomes an `IFCBUILDINGELEMENTPROXY` with a faceted B-rep
//! body, contained in a single site under the project. GlobalIds are derived
//! from the project name and object id so repeated exports are identical.

use super::cad::effective_scale;
use crate::protocol::{BimExportRequest, MeshPayload};
use std::fmt::Write as _;
use uuid::Uuid;

/// Namespace for every GlobalId this writer derives.
const GUID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b3d_5e07_8a12_c4f0_b9d3_7e21);

const GUID_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

pub fn mesh_ifc(request: &BimExportRequest) -> String {
    let name = if request.project_name.trim().is_empty() {
        "bimdraft"
    } else {
        request.project_name.trim()
    };
    let safe_name = escape_step_string(name);
    let scale = effective_scale(request.scale);
    let mut writer = StepWriter::new();

    // Units, context and spatial root.
    let origin = writer.push("IFCCARTESIANPOINT((0.,0.,0.))".to_string());
    let z_axis = writer.push("IFCDIRECTION((0.,0.,1.))".to_string());
    let x_axis = writer.push("IFCDIRECTION((1.,0.,0.))".to_string());
    let world = writer.push(format!("IFCAXIS2PLACEMENT3D(#{origin},#{z_axis},#{x_axis})"));
    let context = writer.push(format!(
        "IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.E-05,#{world},$)"
    ));
    let length_unit = writer.push("IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.)".to_string());
    let units = writer.push(format!("IFCUNITASSIGNMENT((#{length_unit}))"));
    let project = writer.push(format!(
        "IFCPROJECT('{}',$,'{safe_name}',$,$,$,$,(#{context}),#{units})",
        global_id(&[name, "project"])
    ));
    let placement = writer.push(format!("IFCLOCALPLACEMENT($,#{world})"));
    let site = writer.push(format!(
        "IFCSITE('{}',$,'Site',$,$,#{placement},$,$,.ELEMENT.,$,$,$,$,$)",
        global_id(&[name, "site"])
    ));
    writer.push(format!(
        "IFCRELAGGREGATES('{}',$,$,$,#{project},(#{site}))",
        global_id(&[name, "aggregates"])
    ));

    let mut elements = Vec::with_capacity(request.objects.len());
    for object in &request.objects {
        if let Some(id) = write_proxy(&mut writer, object, name, context, placement, scale) {
            elements.push(id);
        }
    }
    if !elements.is_empty() {
        writer.push(format!(
            "IFCRELCONTAINEDINSPATIALSTRUCTURE('{}',$,$,$,({}),#{site})",
            global_id(&[name, "contained"]),
            id_list(&elements)
        ));
    }
    tracing::debug!(elements = elements.len(), "wrote IFC elements");

    let mut out = String::new();
    let _ = writeln!(out, "ISO-10303-21;");
    let _ = writeln!(out, "HEADER;");
    let _ = writeln!(out, "FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');");
    let _ = writeln!(
        out,
        "FILE_NAME('{safe_name}.ifc','1970-01-01T00:00:00',(''),(''),'bimdraft','bimdraft','');"
    );
    let _ = writeln!(out, "FILE_SCHEMA(('IFC4'));");
    let _ = writeln!(out, "ENDSEC;");
    let _ = writeln!(out, "DATA;");
    for line in writer.lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "ENDSEC;");
    let _ = writeln!(out, "END-ISO-10303-21;");
    out
}

/// Returns the proxy's entity id, or `None` when the object has no usable face.
fn write_proxy(
    writer: &mut StepWriter,
    object: &MeshPayload,
    project_name: &str,
    context: u32,
    placement: u32,
    scale: f64,
) -> Option<u32> {
    let faces: Vec<&[usize]> = object.valid_faces().collect();
    if faces.is_empty() {
        return None;
    }

    let points: Vec<u32> = object
        .vertices
        .iter()
        .map(|&[x, y, z]| writer.push(cartesian_point(x * scale, y * scale, z * scale)))
        .collect();

    let mut face_ids = Vec::with_capacity(faces.len());
    for face in faces {
        let loop_points: Vec<u32> = face.iter().map(|&i| points[i]).collect();
        let poly_loop = writer.push(format!("IFCPOLYLOOP(({}))", id_list(&loop_points)));
        let bound = writer.push(format!("IFCFACEOUTERBOUND(#{poly_loop},.T.)"));
        face_ids.push(writer.push(format!("IFCFACE((#{bound}))")));
    }
    let shell = writer.push(format!("IFCCLOSEDSHELL(({}))", id_list(&face_ids)));
    let brep = writer.push(format!("IFCFACETEDBREP(#{shell})"));
    let body = writer.push(format!(
        "IFCSHAPEREPRESENTATION(#{context},'Body','Brep',(#{brep}))"
    ));
    let shape = writer.push(format!("IFCPRODUCTDEFINITIONSHAPE($,$,(#{body}))"));

    let id = escape_step_string(&object.id);
    let kind = if object.kind.is_empty() {
        "$".to_string()
    } else {
        format!("'{}'", escape_step_string(&object.kind))
    };
    Some(writer.push(format!(
        "IFCBUILDINGELEMENTPROXY('{}',$,'{id}',$,{kind},#{placement},#{shape},'{id}',$)",
        global_id(&[project_name, "element", &object.id])
    )))
}

struct StepWriter {
    next_id: u32,
    lines: Vec<String>,
}

impl StepWriter {
    fn new() -> Self {
        Self {
            next_id: 1,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, entity: String) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.lines.push(format!("#{id}={entity};"));
        id
    }
}

/// STEP string literal body: quotes doubled, backslashes doubled, and
/// anything outside printable ASCII written as `\X2\` UTF-16 hex.
fn escape_step_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                out.push_str("\\X2\\");
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "{unit:04X}");
                }
                out.push_str("\\X0\\");
            }
        }
    }
    out
}

fn f64_step(v: f64) -> String {
    if !v.is_finite() {
        return "0.".to_string();
    }
    let mut s = format!("{v:.6}");
    if s == "-0.000000" {
        s = "0.000000".to_string();
    }
    s
}

fn cartesian_point(x: f64, y: f64, z: f64) -> String {
    format!(
        "IFCCARTESIANPOINT(({},{},{}))",
        f64_step(x),
        f64_step(y),
        f64_step(z)
    )
}

fn id_list(ids: &[u32]) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "#{id}");
    }
    out
}

/// 22-character IFC GlobalId of a name-based UUID over `parts`.
fn global_id(parts: &[&str]) -> String {
    let value = Uuid::new_v5(&GUID_NAMESPACE, parts.join("/").as_bytes()).as_u128();

    let mut out = String::with_capacity(22);
    out.push(GUID_ALPHABET[(value >> 126) as usize] as char);
    for k in (0..21).rev() {
        out.push(GUID_ALPHABET[((value >> (k * 6)) & 0x3f) as usize] as char);
    }
    out
}
