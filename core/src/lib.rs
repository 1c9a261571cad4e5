pub mod error;
pub mod tree;
pub mod leaflet;
pub mod template;
pub mod source;
pub mod ids;
pub mod normalize;
pub mod render;
pub mod dynamic;
pub mod envelope;
pub mod assets;
pub mod fingerprint;
pub mod component;
pub mod scene;

pub use error::{TemplateError, TranscodeError};
pub use tree::{Assets, AuxRoles, LatLng, MapNode, MapTree, NodeId, NodeKind, NodeTemplate};
pub use template::{render_template, SlotResolver, SlotValue};
pub use source::{FragmentContext, FragmentSource, TemplateSource};
pub use ids::{child_id, IdentifierMapping};
pub use normalize::{dedent, normalize};
pub use render::{render_tree, FragmentRenderer, RenderedScript, ScriptFragment, DEFAULT_BASE_ID};
pub use dynamic::{BrowserRegistry, DynamicTranscoder, MAP_MOUNT_VAR};
pub use envelope::{EnvelopeField, InteractionEnvelope};
pub use assets::AssetManifest;
pub use fingerprint::content_fingerprint;
pub use component::{ComponentPayload, MapComponent, RenderOptions};
pub use scene::{LoadedScene, Scene, SceneNode, SceneRole};

#[cfg(test)]
mod tests;
